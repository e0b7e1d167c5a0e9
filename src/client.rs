//! Blocking client for daemon communication.

use crate::command::{Command, Reply};
use crate::error::{Result, SpinnerError};
use crate::ipc::messages::{get_socket_path, DaemonRequest, DaemonResponse};
use crate::tracker::{ProcessTracker, TrackerEvent};
use crate::view::ViewBinding;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// Client for communicating with the daemon
pub struct DaemonClient {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl DaemonClient {
    /// Connect to the daemon on the default socket
    pub fn connect() -> Result<Self> {
        Self::connect_to(&get_socket_path())
    }

    pub fn connect_to(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        stream.set_write_timeout(Some(Duration::from_millis(1000)))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { stream, reader })
    }

    /// Send a request and receive its response
    pub fn send(&mut self, request: &DaemonRequest) -> Result<DaemonResponse> {
        self.write_request(request)?;
        self.read_response()
    }

    /// Run a tracker command on the daemon
    pub fn call(&mut self, command: Command) -> Result<Reply> {
        match self.send(&DaemonRequest::Call(command))? {
            DaemonResponse::Reply(reply) => Ok(reply),
            DaemonResponse::Error { message } => Err(SpinnerError::Daemon(message)),
            other => Err(SpinnerError::Daemon(format!(
                "Unexpected response: {:?}",
                other
            ))),
        }
    }

    /// Check daemon status
    pub fn status(&mut self) -> Result<DaemonStatus> {
        match self.send(&DaemonRequest::Status)? {
            DaemonResponse::Status {
                running,
                process_count,
                subscriber_count,
                uptime_secs,
            } => Ok(DaemonStatus {
                running,
                process_count,
                subscriber_count,
                uptime_secs,
            }),
            other => Err(SpinnerError::Daemon(format!(
                "Unexpected response: {:?}",
                other
            ))),
        }
    }

    /// Ping daemon for health check
    pub fn ping(&mut self) -> bool {
        matches!(self.send(&DaemonRequest::Ping), Ok(DaemonResponse::Pong))
    }

    /// Ask the daemon to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.write_request(&DaemonRequest::Shutdown)?;
        // The daemon may exit before answering
        let _ = self.read_response();
        Ok(())
    }

    /// Switch this connection to streaming mode
    pub fn subscribe(mut self) -> Result<Subscription> {
        self.stream.set_read_timeout(None)?;
        self.write_request(&DaemonRequest::Subscribe)?;
        Ok(Subscription { client: self })
    }

    fn write_request(&mut self, request: &DaemonRequest) -> Result<()> {
        let json = serde_json::to_string(request)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<DaemonResponse> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "daemon closed the connection");
            return Err(eof.into());
        }
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Updates streamed from the daemon; ends when the daemon goes away
pub struct Subscription {
    client: DaemonClient,
}

impl Iterator for Subscription {
    type Item = Result<DaemonResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.client.read_response() {
            Err(SpinnerError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => None,
            result => Some(result),
        }
    }
}

/// Daemon status information
#[derive(Debug)]
pub struct DaemonStatus {
    pub running: bool,
    pub process_count: usize,
    pub subscriber_count: usize,
    pub uptime_secs: u64,
}

/// Check if daemon is available (socket exists and responds to ping)
pub fn is_daemon_available() -> bool {
    DaemonClient::connect()
        .map(|mut client| client.ping())
        .unwrap_or(false)
}

/// Replay a streamed update into a local tracker so it mirrors the daemon.
///
/// A process snapshot replaces the local set; notifications are re-applied
/// one reference at a time, and `finishedAll` clears whatever is left.
pub fn replay<V: ViewBinding>(tracker: &mut ProcessTracker<V>, update: &DaemonResponse) {
    match update {
        DaemonResponse::Reply(Reply::Processes(processes)) => {
            tracker.finish_all();
            for record in processes {
                for _ in 0..record.count {
                    tracker.start(&record.name, record.message.as_deref());
                }
            }
        }
        DaemonResponse::Notification(notification) => match &notification.event {
            TrackerEvent::Started { process, record } => {
                tracker.start(process, record.message.as_deref());
            }
            TrackerEvent::Finished { process, .. } => tracker.finish(process, false),
            TrackerEvent::FinishedAll => tracker.finish_all(),
        },
        _ => {}
    }
}
