//! Debug logging utilities.

use chrono::{Local, Utc};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

const LOG_TAG: &str = "[advancedSpinner]";

static DEBUG_LOG_FILE: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Initialize the debug log sink.
///
/// With a path, the file is truncated and receives every traced line;
/// without one, lines go to stderr. Only the first call takes effect.
pub fn init_debug(path: Option<PathBuf>) {
    if let Some(path) = &path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(
            path,
            format!("=== advanced-spinner debug log started at {} ===\n", Utc::now()),
        );
    }
    let _ = DEBUG_LOG_FILE.set(path);
}

/// Default location for the debug log file
pub fn debug_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|c| c.join("advanced-spinner").join("debug.log"))
}

/// Write a debug log line
pub fn debug_log(msg: &str) {
    let line = format_line(&Local::now().format("%H:%M:%S%.3f").to_string(), msg);
    match DEBUG_LOG_FILE.get().and_then(|p| p.as_ref()) {
        Some(path) => {
            if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", line);
            }
        }
        None => eprintln!("{}", line),
    }
}

fn format_line(timestamp: &str, msg: &str) -> String {
    format!("[{}] {}: {}", timestamp, LOG_TAG, msg)
}
