//! IPC message types for daemon-client communication.

use crate::command::{Command, Reply};
use crate::tracker::Notification;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Requests sent from CLI clients to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DaemonRequest {
    /// Run a tracker command
    Call(Command),
    /// Stream notifications and view changes on this connection
    Subscribe,
    /// Request daemon status
    Status,
    /// Graceful shutdown
    Shutdown,
    /// Ping for health check
    Ping,
}

/// What the overlay currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub visible: bool,
    pub messages: Vec<String>,
}

/// Response from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DaemonResponse {
    /// Result of a tracker command
    Reply(Reply),
    /// Tracker notification (sent to subscribers)
    Notification(Notification),
    /// Overlay state (sent to subscribers)
    View(ViewState),
    /// Operation completed successfully
    Ok,
    /// Error response
    Error { message: String },
    /// Pong response for health check
    Pong,
    /// Daemon status info
    Status {
        running: bool,
        process_count: usize,
        subscriber_count: usize,
        uptime_secs: u64,
    },
}

fn runtime_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("advanced-spinner")
}

/// Socket path for daemon communication
pub fn get_socket_path() -> PathBuf {
    runtime_dir().join("daemon.sock")
}

/// PID file path for daemon
pub fn get_pid_file_path() -> PathBuf {
    runtime_dir().join("daemon.pid")
}
