//! Terminal rendering of the overlay.

use crate::view::{Footprint, ViewBinding};
use colored::*;
use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;

const DEFAULT_SPINNER: &str = "⠿ working";
const BULLET: &str = "  • ";

/// Draws the spinner line and message list to a writer.
///
/// In redraw mode the previous block is erased before every draw so the
/// overlay updates in place; otherwise each draw is appended.
pub struct TerminalView<W: Write> {
    out: W,
    redraw: bool,
    template: String,
    visible: bool,
    messages: Vec<String>,
    locked: Option<Footprint>,
    /// Block currently on screen
    drawn: Footprint,
    /// Last block drawn while visible, kept across hides
    shown: Footprint,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, redraw: bool) -> Self {
        Self {
            out,
            redraw,
            template: DEFAULT_SPINNER.to_string(),
            visible: false,
            messages: Vec::new(),
            locked: None,
            drawn: Footprint::default(),
            shown: Footprint::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Spinner line followed by one bullet per message
    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.messages.len() + 1);
        lines.push(self.template.clone());
        lines.extend(self.messages.iter().map(|m| format!("{}{}", BULLET, m)));
        lines
    }

    /// Lines of the overlay as plain text, padded to the locked footprint
    pub fn compose(&self) -> Vec<String> {
        if !self.visible {
            return Vec::new();
        }

        let mut lines = self.lines();
        if let Some(locked) = self.locked {
            let width = locked.width as usize;
            for line in lines.iter_mut() {
                let len = line.chars().count();
                if len < width {
                    line.push_str(&" ".repeat(width - len));
                }
            }
            while lines.len() < locked.height as usize {
                lines.push(" ".repeat(width));
            }
        }
        lines
    }

    fn draw(&mut self) {
        let lines = self.compose();

        if self.redraw && self.drawn.height > 0 {
            let _ = queue!(
                self.out,
                MoveToPreviousLine(self.drawn.height),
                Clear(ClearType::FromCursorDown)
            );
        }

        for (i, line) in lines.iter().enumerate() {
            let styled = if i == 0 {
                line.cyan().bold()
            } else {
                line.normal()
            };
            let _ = writeln!(self.out, "{}", styled);
        }
        if lines.is_empty() && !self.redraw {
            let _ = writeln!(self.out, "{}", "(spinner hidden)".dimmed());
        }
        let _ = self.out.flush();

        self.drawn = Footprint::of_lines(&lines);
        if self.visible {
            self.shown = self.drawn;
            // A frozen block grows but never shrinks
            if let Some(locked) = self.locked {
                self.locked = Some(locked.union(self.drawn));
            }
        }
    }
}

impl<W: Write> ViewBinding for TerminalView<W> {
    fn show(&mut self) {
        self.visible = true;
        self.draw();
    }

    fn hide(&mut self) {
        self.visible = false;
        self.draw();
    }

    fn render_messages(&mut self, messages: &[String]) {
        if self.messages == messages {
            return;
        }
        self.messages = messages.to_vec();
        if self.visible {
            self.draw();
        }
    }

    /// Last visible block, or the unpadded block if it was never shown
    fn measure_footprint(&self) -> Footprint {
        self.shown.union(Footprint::of_lines(&self.lines()))
    }

    fn lock_footprint(&mut self, width: u16, height: u16) {
        self.locked = Some(Footprint::new(width, height));
    }

    fn unlock_footprint(&mut self) {
        self.locked = None;
    }

    fn mount(&mut self, template: Option<&str>) {
        if let Some(template) = template.filter(|t| !t.is_empty()) {
            self.template = template.to_string();
        }
    }

    fn unmount(&mut self) {
        if self.redraw && self.drawn.height > 0 {
            let _ = queue!(
                self.out,
                MoveToPreviousLine(self.drawn.height),
                Clear(ClearType::FromCursorDown)
            );
            let _ = self.out.flush();
        }
        self.visible = false;
        self.drawn = Footprint::default();
    }
}
