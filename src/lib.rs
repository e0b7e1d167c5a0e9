//! advanced-spinner
//!
//! Shows a loading overlay while named processes are in flight and hides it
//! once every one of them has finished.

pub mod client;
pub mod command;
pub mod config;
pub mod daemon;
pub mod debug;
pub mod error;
pub mod ipc;
pub mod shared;
pub mod terminal;
pub mod tracker;
pub mod view;

pub use command::{Command, Reply};
pub use config::SpinnerConfig;
pub use error::SpinnerError;
pub use shared::SharedTracker;
pub use terminal::TerminalView;
pub use tracker::{
    Notification, ProcessRecord, ProcessSet, ProcessTracker, TrackerEvent, Visibility,
};
pub use view::{Footprint, NullView, ViewBinding};
