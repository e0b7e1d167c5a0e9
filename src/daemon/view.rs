//! View that publishes overlay changes to daemon subscribers.

use crate::ipc::messages::{DaemonResponse, ViewState};
use crate::view::{Footprint, ViewBinding};
use tokio::sync::broadcast;

/// Headless view whose only output is the broadcast channel.
///
/// The daemon has no surface of its own: its footprint is the message list
/// last published while visible, and the lock is only remembered. Watchers
/// size their own output.
pub struct BroadcastView {
    tx: broadcast::Sender<DaemonResponse>,
    state: ViewState,
    locked: Option<Footprint>,
    shown: Footprint,
}

impl BroadcastView {
    pub fn new(tx: broadcast::Sender<DaemonResponse>) -> Self {
        Self {
            tx,
            state: ViewState::default(),
            locked: None,
            shown: Footprint::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn locked(&self) -> Option<Footprint> {
        self.locked
    }

    fn publish(&mut self) {
        if self.state.visible {
            self.shown = Footprint::of_lines(&self.state.messages);
        }
        // No subscribers is not an error
        let _ = self.tx.send(DaemonResponse::View(self.state.clone()));
    }
}

impl ViewBinding for BroadcastView {
    fn show(&mut self) {
        self.state.visible = true;
        self.publish();
    }

    fn hide(&mut self) {
        self.state.visible = false;
        self.publish();
    }

    fn render_messages(&mut self, messages: &[String]) {
        if self.state.messages == messages {
            return;
        }
        self.state.messages = messages.to_vec();
        if self.state.visible {
            self.publish();
        }
    }

    fn measure_footprint(&self) -> Footprint {
        self.shown.union(Footprint::of_lines(&self.state.messages))
    }

    fn lock_footprint(&mut self, width: u16, height: u16) {
        self.locked = Some(Footprint::new(width, height));
    }

    fn unlock_footprint(&mut self) {
        self.locked = None;
    }
}
