//! Unix socket server for the daemon.

use crate::command::{Command, Reply};
use crate::config::SpinnerConfig;
use crate::daemon::view::BroadcastView;
use crate::ipc::messages::{
    get_pid_file_path, get_socket_path, DaemonRequest, DaemonResponse, ViewState,
};
use crate::shared::SharedTracker;
use crate::tracker::ProcessTracker;
use anyhow::{Context, Result};
use std::fs;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// State shared by every connection
#[derive(Clone)]
struct DaemonContext {
    tracker: SharedTracker<BroadcastView>,
    start_time: Instant,
    /// Channel for broadcasting notifications and view changes to subscribers
    broadcast_tx: broadcast::Sender<DaemonResponse>,
}

/// Daemon server hosting one shared tracker
pub struct DaemonServer {
    ctx: DaemonContext,
}

impl DaemonServer {
    /// Create a new daemon server
    pub fn new(config: SpinnerConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);

        let mut tracker = ProcessTracker::new(config, BroadcastView::new(broadcast_tx.clone()));
        let tx = broadcast_tx.clone();
        tracker.subscribe(move |notification| {
            let _ = tx.send(DaemonResponse::Notification(notification.clone()));
        });

        Self {
            ctx: DaemonContext {
                tracker: SharedTracker::new(tracker),
                start_time: Instant::now(),
                broadcast_tx,
            },
        }
    }

    /// Run the daemon server on the default socket
    pub async fn run(&self) -> Result<()> {
        let socket_path = get_socket_path();

        // Ensure socket directory exists
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent).context("Failed to create socket directory")?;
        }

        // Remove existing socket file
        if socket_path.exists() {
            fs::remove_file(&socket_path).context("Failed to remove existing socket")?;
        }

        fs::write(get_pid_file_path(), std::process::id().to_string())
            .context("Failed to write PID file")?;

        let listener = UnixListener::bind(&socket_path).context("Failed to bind to socket")?;
        eprintln!("Daemon listening on {:?}", socket_path);

        self.serve(listener).await
    }

    /// Accept connections on `listener` until the process exits
    pub async fn serve(&self, listener: UnixListener) -> Result<()> {
        loop {
            let (stream, _) = listener.accept().await.context("Failed to accept connection")?;
            let ctx = self.ctx.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, ctx).await {
                    eprintln!("Connection error: {}", e);
                }
            });
        }
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.ctx.broadcast_tx.receiver_count()
    }

    /// Handle one request that does not need the connection
    pub fn handle_request(&self, request: DaemonRequest) -> DaemonResponse {
        self.ctx.handle_request(request)
    }

    pub fn tracker(&self) -> &SharedTracker<BroadcastView> {
        &self.ctx.tracker
    }
}

impl DaemonContext {
    fn handle_request(&self, request: DaemonRequest) -> DaemonResponse {
        match request {
            // The shared tracker outlives every client
            DaemonRequest::Call(Command::Destroy) => DaemonResponse::Error {
                message: "destroy is not available on the daemon, use `stop`".to_string(),
            },

            DaemonRequest::Call(command) => DaemonResponse::Reply(self.tracker.dispatch(command)),

            DaemonRequest::Status => DaemonResponse::Status {
                running: true,
                process_count: self.tracker.get_processes().len(),
                subscriber_count: self.broadcast_tx.receiver_count(),
                uptime_secs: self.start_time.elapsed().as_secs(),
            },

            DaemonRequest::Ping => DaemonResponse::Pong,

            // Connection-level requests
            DaemonRequest::Subscribe | DaemonRequest::Shutdown => DaemonResponse::Error {
                message: "Request must be sent over a connection".to_string(),
            },
        }
    }

    /// New broadcast receiver plus the process set and overlay state it
    /// starts from.
    ///
    /// Listeners publish while the tracker is locked, so no update can fall
    /// between the snapshot and the receiver.
    fn subscribe_with_snapshot(
        &self,
    ) -> (broadcast::Receiver<DaemonResponse>, [DaemonResponse; 2]) {
        let tracker = self.tracker.lock();
        let rx = self.broadcast_tx.subscribe();
        let view = ViewState {
            visible: tracker.visibility().is_visible(),
            messages: tracker.messages(),
        };
        let snapshot = [
            DaemonResponse::Reply(Reply::Processes(tracker.get_processes())),
            DaemonResponse::View(view),
        ];
        (rx, snapshot)
    }
}

/// Handle a single client connection
async fn handle_connection(stream: UnixStream, ctx: DaemonContext) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Read requests line by line (newline-delimited JSON)
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // Connection closed
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                let response = DaemonResponse::Error {
                    message: format!("Invalid request: {}", e),
                };
                send_response(&mut writer, &response).await?;
                continue;
            }
        };

        match request {
            DaemonRequest::Subscribe => return stream_updates(&mut writer, &ctx).await,
            DaemonRequest::Shutdown => {
                eprintln!("Shutdown requested, exiting...");
                send_response(&mut writer, &DaemonResponse::Ok).await?;
                cleanup_runtime_files();
                std::process::exit(0);
            }
            request => {
                let response = ctx.handle_request(request);
                send_response(&mut writer, &response).await?;
            }
        }
    }

    Ok(())
}

/// Forward every broadcast to a subscriber until it disconnects
async fn stream_updates(writer: &mut OwnedWriteHalf, ctx: &DaemonContext) -> Result<()> {
    let (mut rx, snapshot) = ctx.subscribe_with_snapshot();
    for response in &snapshot {
        send_response(writer, response).await?;
    }

    loop {
        match rx.recv().await {
            Ok(response) => send_response(writer, &response).await?,
            Err(RecvError::Lagged(skipped)) => {
                // Updates still queued are covered by the new snapshot
                eprintln!("Subscriber lagged by {} updates, resyncing", skipped);
                let (fresh, snapshot) = ctx.subscribe_with_snapshot();
                rx = fresh;
                for response in &snapshot {
                    send_response(writer, response).await?;
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
    Ok(())
}

/// Send a response to a client
async fn send_response(writer: &mut OwnedWriteHalf, response: &DaemonResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Remove socket and pid files
pub fn cleanup_runtime_files() {
    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(get_pid_file_path());
}

/// Check if daemon is running
pub fn is_daemon_running() -> bool {
    let socket_path = get_socket_path();
    if !socket_path.exists() {
        return false;
    }
    std::os::unix::net::UnixStream::connect(&socket_path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{self, DaemonClient};
    use crate::tracker::TrackerEvent;
    use crate::view::NullView;

    fn start(name: &str, message: Option<&str>) -> DaemonRequest {
        DaemonRequest::Call(Command::Start {
            name: name.to_string(),
            message: message.map(str::to_string),
        })
    }

    #[test]
    fn test_handle_call_and_status() {
        let server = DaemonServer::new(SpinnerConfig::default());

        let response = server.handle_request(start("build", Some("Compiling")));
        assert!(matches!(response, DaemonResponse::Reply(Reply::Done)));
        assert!(server.tracker().is_running("build"));

        match server.handle_request(DaemonRequest::Status) {
            DaemonResponse::Status {
                running,
                process_count,
                ..
            } => {
                assert!(running);
                assert_eq!(process_count, 1);
            }
            other => panic!("unexpected response {:?}", other),
        }
        assert!(matches!(
            server.handle_request(DaemonRequest::Ping),
            DaemonResponse::Pong
        ));
    }

    #[test]
    fn test_subscribe_needs_connection() {
        let server = DaemonServer::new(SpinnerConfig::default());
        assert!(matches!(
            server.handle_request(DaemonRequest::Subscribe),
            DaemonResponse::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_broadcasts_notifications_and_view() {
        let server = DaemonServer::new(SpinnerConfig::default());
        let mut rx = server.ctx.broadcast_tx.subscribe();

        server.handle_request(start("build", Some("Compiling")));
        server.handle_request(DaemonRequest::Call(Command::Finish {
            name: "build".to_string(),
            force: false,
        }));

        let mut names = Vec::new();
        let mut views = Vec::new();
        while let Ok(response) = rx.try_recv() {
            match response {
                DaemonResponse::Notification(n) => names.push(n.name),
                DaemonResponse::View(v) => views.push(v.visible),
                _ => {}
            }
        }
        assert_eq!(names, vec!["started", "finished", "finishedAll"]);
        assert_eq!(views, vec![true, false]);
    }

    #[test]
    fn test_destroy_rejected_over_ipc() {
        let server = DaemonServer::new(SpinnerConfig::default());
        let mut rx = server.ctx.broadcast_tx.subscribe();

        assert!(matches!(
            server.handle_request(DaemonRequest::Call(Command::Destroy)),
            DaemonResponse::Error { .. }
        ));
        assert!(!server.tracker().lock().is_destroyed());

        server.handle_request(start("build", None));
        let mut notifications = 0;
        while let Ok(response) = rx.try_recv() {
            if matches!(response, DaemonResponse::Notification(_)) {
                notifications += 1;
            }
        }
        assert_eq!(notifications, 1);
    }

    async fn next_update(reader: &mut BufReader<UnixStream>) -> DaemonResponse {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(line.trim()).unwrap()
    }

    #[tokio::test]
    async fn test_lagging_subscriber_resyncs_without_replaying_stale_updates() {
        let server = DaemonServer::new(SpinnerConfig::default());
        let (daemon_end, watcher_end) = UnixStream::pair().unwrap();
        let (_daemon_read, mut writer) = daemon_end.into_split();
        let ctx = server.ctx.clone();
        tokio::spawn(async move {
            let _ = stream_updates(&mut writer, &ctx).await;
        });

        let mut reader = BufReader::new(watcher_end);
        let mut mirror = ProcessTracker::new(SpinnerConfig::default(), NullView);
        for _ in 0..2 {
            let update = next_update(&mut reader).await;
            client::replay(&mut mirror, &update);
        }

        // More updates than the channel holds, without letting the stream run
        for _ in 0..300 {
            server.handle_request(start("a", None));
        }

        loop {
            let update = next_update(&mut reader).await;
            client::replay(&mut mirror, &update);
            if matches!(update, DaemonResponse::Reply(Reply::Processes(_))) {
                break;
            }
        }

        server.handle_request(start("marker", None));
        loop {
            let update = next_update(&mut reader).await;
            client::replay(&mut mirror, &update);
            if let DaemonResponse::Notification(n) = &update {
                if n.event.process() == Some("marker") {
                    break;
                }
            }
        }

        assert_eq!(mirror.get_processes(), server.tracker().get_processes());
        assert_eq!(mirror.get_processes().get("a").map(|r| r.count), Some(300));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_socket_round_trip() {
        let dir = std::env::temp_dir().join(format!("advanced-spinner-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let socket_path = dir.join("daemon.sock");
        let _ = fs::remove_file(&socket_path);

        let listener = UnixListener::bind(&socket_path).unwrap();
        let server = DaemonServer::new(SpinnerConfig::default());
        let tracker = server.tracker().clone();
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let path = socket_path.clone();
        let (reply, first_event) = tokio::task::spawn_blocking(move || {
            let watcher = DaemonClient::connect_to(&path).unwrap();
            let mut updates = watcher.subscribe().unwrap();
            // Initial snapshot
            assert!(matches!(
                updates.next(),
                Some(Ok(DaemonResponse::Reply(Reply::Processes(_))))
            ));
            assert!(matches!(updates.next(), Some(Ok(DaemonResponse::View(_)))));

            let mut client = DaemonClient::connect_to(&path).unwrap();
            client.call(Command::Start {
                name: "upload".to_string(),
                message: None,
            })
            .unwrap();
            let reply = client
                .call(Command::IsRunning {
                    name: "upload".to_string(),
                })
                .unwrap();
            (reply, updates.next())
        })
        .await
        .unwrap();

        assert_eq!(reply, Reply::Running(true));
        match first_event {
            Some(Ok(DaemonResponse::Notification(n))) => {
                assert!(matches!(n.event, TrackerEvent::Started { .. }));
            }
            other => panic!("unexpected update {:?}", other),
        }
        assert!(tracker.is_running("upload"));
        let _ = fs::remove_file(&socket_path);
    }
}
