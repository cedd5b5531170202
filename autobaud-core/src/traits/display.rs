//! Text display backend
//!
//! Pixel rendering and font rasterization stay behind this trait. A
//! backend only has to place a line of ASCII text on a row.

/// Row-addressed text display
pub trait DisplayBackend {
    /// Backend-specific error
    type Error;

    /// Number of text rows
    fn rows(&self) -> u8;

    /// Characters per row
    fn columns(&self) -> u8;

    /// Blank the frame buffer
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Draw text at the start of a row
    ///
    /// `text` never exceeds [`columns`](Self::columns) characters.
    fn draw_text(&mut self, row: u8, text: &str) -> Result<(), Self::Error>;

    /// Push the frame buffer to the panel
    fn flush(&mut self) -> Result<(), Self::Error>;
}
