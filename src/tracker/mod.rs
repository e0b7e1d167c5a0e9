//! Reference-counted process tracking that drives the overlay.
//!
//! Every `start(name)` bumps the count of `name`, every `finish(name)`
//! releases one reference. The overlay is showing exactly while at least one
//! process is running.

pub mod events;
pub mod process;

use crate::config::SpinnerConfig;
use crate::debug::debug_log;
use crate::view::ViewBinding;
pub use events::{Listener, Notification, TrackerEvent, Visibility};
pub use process::{ProcessRecord, ProcessSet};

/// Tracks running processes and keeps a view in sync with them
pub struct ProcessTracker<V: ViewBinding> {
    processes: ProcessSet,
    visibility: Visibility,
    config: SpinnerConfig,
    view: V,
    listeners: Vec<Listener>,
    /// Footprint currently locked on the view
    frozen: bool,
    destroyed: bool,
}

impl<V: ViewBinding> ProcessTracker<V> {
    /// Create a tracker and mount its overlay on `view`
    pub fn new(config: SpinnerConfig, mut view: V) -> Self {
        view.mount(config.spinner.as_deref());
        let tracker = Self {
            processes: ProcessSet::new(),
            visibility: Visibility::Hidden,
            config,
            view,
            listeners: Vec::new(),
            frozen: false,
            destroyed: false,
        };
        tracker.debug("Initialization done");
        tracker
    }

    pub fn config(&self) -> &SpinnerConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Register an observer for every notification
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Notification) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.processes.contains(name)
    }

    pub fn is_any_process_running(&self) -> bool {
        !self.processes.is_empty()
    }

    /// Copy of the running processes
    pub fn get_processes(&self) -> ProcessSet {
        self.processes.clone()
    }

    /// Messages currently shown, in set order
    pub fn messages(&self) -> Vec<String> {
        self.processes.messages()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Start (or re-enter) a process.
    ///
    /// A non-empty `message` replaces the process message; an empty or
    /// missing one keeps the previous message.
    pub fn start(&mut self, name: &str, message: Option<&str>) {
        let record = self.processes.entry(name);
        record.count = record.count.saturating_add(1);
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            record.message = Some(message.to_string());
        }
        let snapshot = record.clone();

        self.debug(&format!(
            "Process \"{}\" started (count: {})",
            name, snapshot.count
        ));
        self.trigger(TrackerEvent::Started {
            process: name.to_string(),
            record: snapshot,
        });
        self.refresh_view();
    }

    /// Release one reference of `name`, or all of them when `force` is set.
    ///
    /// Unknown names are ignored.
    pub fn finish(&mut self, name: &str, force: bool) {
        if !self.release(name, force) {
            self.debug(&format!("Process \"{}\" is not running", name));
            return;
        }
        if self.processes.is_empty() {
            self.trigger(TrackerEvent::FinishedAll);
        }
        self.refresh_view();
    }

    /// Force-finish every running process.
    ///
    /// Emits a single `finishedAll` after draining; does nothing when no
    /// process is running.
    pub fn finish_all(&mut self) {
        if self.processes.is_empty() {
            return;
        }
        for name in self.processes.names() {
            self.release(&name, true);
        }
        self.trigger(TrackerEvent::FinishedAll);
        self.refresh_view();
    }

    /// Detach from the view. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.frozen {
            self.view.unlock_footprint();
            self.frozen = false;
        }
        self.view.unmount();
        self.listeners.clear();
        self.destroyed = true;
        self.debug("Spinner has been destroyed");
    }

    /// Decrement `name`, emitting `finished` per released reference.
    /// Returns false when `name` was not running.
    fn release(&mut self, name: &str, force: bool) -> bool {
        let Some(record) = self.processes.get_mut(name) else {
            return false;
        };

        let mut released = Vec::new();
        loop {
            record.count = record.count.saturating_sub(1);
            released.push(record.clone());
            if !force || record.count == 0 {
                break;
            }
        }
        if record.count == 0 {
            self.processes.remove(name);
        }

        self.debug(&format!(
            "Process \"{}\" finished {} time(s){}",
            name,
            released.len(),
            if force { " (forced)" } else { "" }
        ));
        for record in released {
            self.trigger(TrackerEvent::Finished {
                process: name.to_string(),
                record,
            });
        }
        true
    }

    /// Bring visibility and the view in line with the process set
    pub(crate) fn refresh_view(&mut self) {
        let target = if self.processes.is_empty() {
            Visibility::Hidden
        } else {
            Visibility::Showed
        };

        match (self.visibility, target) {
            (Visibility::Hidden, Visibility::Showed) => {
                if self.config.freeze_size {
                    let footprint = self.view.measure_footprint();
                    self.view.lock_footprint(footprint.width, footprint.height);
                    self.frozen = true;
                }
                self.view.render_messages(&self.processes.messages());
                self.view.show();
                self.debug("Spinner has been showed");
            }
            (Visibility::Showed, Visibility::Hidden) => {
                self.view.hide();
                self.view.render_messages(&[]);
                if self.frozen {
                    self.view.unlock_footprint();
                    self.frozen = false;
                }
                self.debug("Spinner has been hidden");
            }
            _ => self.view.render_messages(&self.processes.messages()),
        }
        self.visibility = target;
    }

    fn trigger(&mut self, event: TrackerEvent) {
        let notification = Notification::new(&self.config.event_prefix, event);
        for listener in self.listeners.iter_mut() {
            listener(&notification);
        }
        self.debug(&format!("Event \"{}\" is triggered", notification.name));
    }

    fn debug(&self, msg: &str) {
        if self.config.debug {
            debug_log(msg);
        }
    }
}
