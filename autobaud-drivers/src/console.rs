//! Scrolling text console
//!
//! Keeps the most recent lines that fit on the display and redraws the
//! whole screen on each new line, oldest at the top. Lines longer than
//! the display are truncated, not wrapped. Rendering errors are counted
//! and otherwise ignored; status output never blocks detection.

use core::fmt::Write;

use heapless::{Deque, String};

use autobaud_core::candidate::{FrameConfig, Parity};
use autobaud_core::traits::{DisplayBackend, StatusSink};

/// Line store plus backend
///
/// `LINES` and `COLS` bound the stored text; a backend with fewer rows or
/// columns shows less.
pub struct ScrollConsole<B, const LINES: usize, const COLS: usize> {
    backend: B,
    lines: Deque<String<COLS>, LINES>,
    render_errors: u32,
}

impl<B: DisplayBackend, const LINES: usize, const COLS: usize> ScrollConsole<B, LINES, COLS> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            lines: Deque::new(),
            render_errors: 0,
        }
    }

    /// Append a line and redraw
    pub fn add_line(&mut self, text: &str) {
        let visible = self.visible_rows();
        while self.lines.len() >= visible.max(1) {
            self.lines.pop_front();
        }

        let width = COLS.min(self.backend.columns() as usize);
        let mut line = String::new();
        for c in text.chars().take(width) {
            let c = if c.is_ascii() && !c.is_ascii_control() { c } else { '?' };
            let _ = line.push(c);
        }
        let _ = self.lines.push_back(line);

        self.redraw();
    }

    /// Drop every line and blank the screen
    pub fn clear(&mut self) {
        self.lines.clear();
        self.redraw();
    }

    /// Lines currently held, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    pub fn render_errors(&self) -> u32 {
        self.render_errors
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn visible_rows(&self) -> usize {
        LINES.min(self.backend.rows() as usize)
    }

    fn redraw(&mut self) {
        if self.try_redraw().is_err() {
            self.render_errors = self.render_errors.wrapping_add(1);
        }
    }

    fn try_redraw(&mut self) -> Result<(), B::Error> {
        self.backend.clear()?;
        for (row, line) in self.lines.iter().enumerate() {
            self.backend.draw_text(row as u8, line)?;
        }
        self.backend.flush()
    }
}

impl<B: DisplayBackend, const LINES: usize, const COLS: usize> StatusSink
    for ScrollConsole<B, LINES, COLS>
{
    fn show_status(&mut self, msg: &str) {
        self.add_line(msg);
    }

    fn show_detected_config(&mut self, config: &FrameConfig) {
        let mut line: String<24> = String::new();

        let _ = write!(line, "Baud: {}", config.baud_rate());
        self.add_line(&line);

        line.clear();
        let _ = write!(line, "Data: {} bits", config.data_bits().bits());
        self.add_line(&line);

        let parity = match config.parity() {
            Parity::None => "NONE",
            Parity::Even => "EVEN",
            Parity::Odd => "ODD",
        };
        line.clear();
        let _ = write!(line, "Parity: {}", parity);
        self.add_line(&line);

        line.clear();
        let _ = write!(line, "Stop: {}", config.stop_bits().bits());
        self.add_line(&line);
    }

    fn show_received_text(&mut self, chunk: &str) {
        self.add_line(chunk);
    }
}
