//! Lifecycle notifications emitted by the tracker.

use super::process::ProcessRecord;
use serde::{Deserialize, Serialize};

/// Derived visibility of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Hidden,
    Showed,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Showed
    }
}

/// Tracker state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerEvent {
    /// A process was started (record snapshot taken after the increment)
    Started {
        process: String,
        record: ProcessRecord,
    },
    /// One reference of a process was released
    Finished {
        process: String,
        record: ProcessRecord,
    },
    /// The set became empty
    FinishedAll,
}

impl TrackerEvent {
    /// Unprefixed event name
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerEvent::Started { .. } => "started",
            TrackerEvent::Finished { .. } => "finished",
            TrackerEvent::FinishedAll => "finishedAll",
        }
    }

    /// Process name the event refers to, if any
    pub fn process(&self) -> Option<&str> {
        match self {
            TrackerEvent::Started { process, .. } | TrackerEvent::Finished { process, .. } => {
                Some(process.as_str())
            }
            TrackerEvent::FinishedAll => None,
        }
    }
}

/// An event as delivered to listeners, with its prefixed name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub name: String,
    pub event: TrackerEvent,
}

impl Notification {
    pub fn new(prefix: &str, event: TrackerEvent) -> Self {
        Self {
            name: format!("{}{}", prefix, event.kind()),
            event,
        }
    }
}

/// Observer callback
pub type Listener = Box<dyn FnMut(&Notification) + Send>;
