use advanced_spinner::client::{self, DaemonClient};
use advanced_spinner::config::get_config_file_path;
use advanced_spinner::daemon::server::{cleanup_runtime_files, is_daemon_running, DaemonServer};
use advanced_spinner::debug::{debug_log_path, init_debug};
use advanced_spinner::{
    Command, Notification, ProcessSet, ProcessTracker, Reply, SpinnerConfig, TerminalView,
    TrackerEvent,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "advanced-spinner")]
#[command(about = "Loading overlay that stays up while named processes are running")]
struct Args {
    /// Config file (default: <config dir>/advanced-spinner/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace every operation to the debug log
    #[arg(short, long)]
    debug: bool,

    /// Do not lock the overlay size while it is showing
    #[arg(long)]
    no_freeze: bool,

    /// Prefix for emitted event names
    #[arg(short, long)]
    event_prefix: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run a script of calls (one per line) against a local spinner
    Run {
        /// Script file; reads stdin when omitted
        script: Option<PathBuf>,
    },
    /// Run the daemon in the foreground
    Daemon,
    /// Send one call to the daemon, e.g. `call start build "Compiling"`
    Call {
        method: String,
        args: Vec<String>,
    },
    /// Show the daemon's spinner, updating in place
    Watch,
    /// Show daemon status
    Status,
    /// Stop the daemon
    Stop,
}

fn load_config(args: &Args) -> Result<SpinnerConfig> {
    let path = args.config.clone().unwrap_or_else(get_config_file_path);
    let mut config = SpinnerConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if args.debug {
        config.debug = true;
    }
    if args.no_freeze {
        config.freeze_size = false;
    }
    if let Some(prefix) = &args.event_prefix {
        config.event_prefix = prefix.clone();
    }
    Ok(config)
}

/// Split a script line into words; double quotes group words, `\"` escapes
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        bail!("Unterminated quote in: {}", line);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn format_notification(notification: &Notification) -> String {
    match &notification.event {
        TrackerEvent::Started { process, record } => format!(
            "{} {} (count {}){}",
            notification.name.green(),
            process,
            record.count,
            record
                .message
                .as_ref()
                .map(|m| format!(" - {}", m))
                .unwrap_or_default()
        ),
        TrackerEvent::Finished { process, record } => format!(
            "{} {} (count {})",
            notification.name.yellow(),
            process,
            record.count
        ),
        TrackerEvent::FinishedAll => notification.name.blue().bold().to_string(),
    }
}

fn format_processes(processes: &ProcessSet) -> Vec<String> {
    if processes.is_empty() {
        return vec!["(no processes running)".dimmed().to_string()];
    }
    processes
        .iter()
        .map(|record| {
            format!(
                "{} x{}{}",
                record.name.bold(),
                record.count,
                record
                    .message
                    .as_ref()
                    .map(|m| format!("  {}", m.dimmed()))
                    .unwrap_or_default()
            )
        })
        .collect()
}

fn print_reply(method: &str, reply: &Reply) {
    match reply {
        Reply::Done => {}
        Reply::Running(running) => {
            let value = if *running { "true".green() } else { "false".red() };
            println!("{}: {}", method, value);
        }
        Reply::Processes(processes) => {
            for line in format_processes(processes) {
                println!("{}", line);
            }
        }
    }
}

fn run_script(config: SpinnerConfig, script: Option<PathBuf>) -> Result<()> {
    let reader: Box<dyn BufRead> = match &script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut tracker = ProcessTracker::new(config, TerminalView::new(io::stdout(), false));
    tracker.subscribe(|n| println!("{}", format_notification(n)));

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read script")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let words = split_args(trimmed)?;
        let Some((method, rest)) = words.split_first() else {
            continue;
        };

        if method == "sleep" {
            let ms: u64 = rest
                .first()
                .and_then(|v| v.parse().ok())
                .with_context(|| format!("line {}: sleep needs milliseconds", index + 1))?;
            thread::sleep(Duration::from_millis(ms));
            continue;
        }

        match Command::from_call(method, rest) {
            Ok(command) => {
                let reply = tracker.dispatch(command);
                print_reply(method, &reply);
            }
            Err(e) => eprintln!("{} line {}: {}", "Error:".red(), index + 1, e),
        }
    }

    tracker.destroy();
    Ok(())
}

fn run_daemon(config: SpinnerConfig) -> Result<()> {
    if is_daemon_running() {
        bail!("Daemon is already running");
    }

    ctrlc::set_handler(|| {
        cleanup_runtime_files();
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let server = DaemonServer::new(config);
    runtime.block_on(server.run())
}

fn connect() -> Result<DaemonClient> {
    DaemonClient::connect()
        .context("Daemon is not running (start it with `advanced-spinner daemon`)")
}

fn run_watch(config: SpinnerConfig) -> Result<()> {
    let updates = connect()?.subscribe().context("Failed to subscribe")?;

    execute!(io::stdout(), Hide)?;
    scopeguard::defer! {
        let _ = execute!(io::stdout(), Show);
    }
    ctrlc::set_handler(|| {
        let _ = execute!(io::stdout(), Show);
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    println!(
        "advanced-spinner - watching since {} - Ctrl+C to exit",
        chrono::Local::now().format("%H:%M:%S").to_string().dimmed()
    );
    println!();

    let mut tracker = ProcessTracker::new(config, TerminalView::new(io::stdout(), true));
    for update in updates {
        let update = update.context("Lost connection to daemon")?;
        client::replay(&mut tracker, &update);
    }
    tracker.destroy();

    println!("{}", "Daemon stopped".yellow());
    Ok(())
}

fn run_status() -> Result<()> {
    if !is_daemon_running() {
        println!("Daemon: {}", "not running".yellow());
        return Ok(());
    }
    let status = connect()?.status()?;
    println!(
        "Daemon: {}",
        if status.running { "running".green() } else { "stopped".red() }
    );
    println!("  Processes:   {}", status.process_count);
    println!("  Subscribers: {}", status.subscriber_count);
    println!("  Uptime:      {}s", status.uptime_secs);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if config.debug {
        // In-place and background output must not be interleaved with traces
        match args.action {
            Action::Daemon | Action::Watch => init_debug(debug_log_path()),
            _ => init_debug(None),
        }
    }

    match args.action {
        Action::Run { script } => run_script(config, script),
        Action::Daemon => run_daemon(config),
        Action::Call { method, args } => {
            let command = Command::from_call(&method, &args)?;
            let reply = connect()?.call(command)?;
            print_reply(&method, &reply);
            Ok(())
        }
        Action::Watch => run_watch(config),
        Action::Status => run_status(),
        Action::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }
            connect()?.shutdown()?;
            println!("Daemon stopped");
            Ok(())
        }
    }
}
