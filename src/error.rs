//! Library error type.
//!
//! Tracker operations themselves never fail; errors only come from parsing
//! calls, loading configuration and talking to the daemon.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpinnerError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Method {0} is private and cannot be called")]
    PrivateMethod(String),

    #[error("Method {method} requires argument '{argument}'")]
    MissingArgument {
        method: String,
        argument: &'static str,
    },

    #[error("Invalid value '{value}' for argument '{argument}'")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },

    #[error("Failed to read config file {}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Daemon I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid daemon message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Daemon error: {0}")]
    Daemon(String),
}

pub type Result<T> = std::result::Result<T, SpinnerError>;
