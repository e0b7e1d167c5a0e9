//! Host surface the overlay is drawn on.

use serde::{Deserialize, Serialize};

/// Rendered size of the host surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u16,
    pub height: u16,
}

impl Footprint {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Widest line by number of lines
    pub fn of_lines(lines: &[String]) -> Self {
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Self::new(
            width.min(u16::MAX as usize) as u16,
            lines.len().min(u16::MAX as usize) as u16,
        )
    }

    /// Smallest footprint covering both
    pub fn union(self, other: Footprint) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Operations the tracker needs from the surface it controls.
///
/// `mount` is called once when the tracker is created and `unmount` once on
/// `destroy`; both default to doing nothing.
pub trait ViewBinding {
    fn show(&mut self);
    fn hide(&mut self);
    fn render_messages(&mut self, messages: &[String]);
    fn measure_footprint(&self) -> Footprint;
    fn lock_footprint(&mut self, width: u16, height: u16);
    fn unlock_footprint(&mut self);

    /// Attach the overlay, with the optional spinner template inside it
    fn mount(&mut self, _template: Option<&str>) {}

    /// Detach the overlay
    fn unmount(&mut self) {}
}

impl<V: ViewBinding + ?Sized> ViewBinding for Box<V> {
    fn show(&mut self) {
        (**self).show()
    }

    fn hide(&mut self) {
        (**self).hide()
    }

    fn render_messages(&mut self, messages: &[String]) {
        (**self).render_messages(messages)
    }

    fn measure_footprint(&self) -> Footprint {
        (**self).measure_footprint()
    }

    fn lock_footprint(&mut self, width: u16, height: u16) {
        (**self).lock_footprint(width, height)
    }

    fn unlock_footprint(&mut self) {
        (**self).unlock_footprint()
    }

    fn mount(&mut self, template: Option<&str>) {
        (**self).mount(template)
    }

    fn unmount(&mut self) {
        (**self).unmount()
    }
}

/// View for headless trackers
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewBinding for NullView {
    fn show(&mut self) {}
    fn hide(&mut self) {}
    fn render_messages(&mut self, _messages: &[String]) {}
    fn measure_footprint(&self) -> Footprint {
        Footprint::default()
    }
    fn lock_footprint(&mut self, _width: u16, _height: u16) {}
    fn unlock_footprint(&mut self) {}
}
