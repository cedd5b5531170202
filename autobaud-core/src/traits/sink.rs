//! Status output for the operator

use crate::candidate::FrameConfig;

/// Display/log sink
///
/// All calls are fire-and-forget: a sink that cannot render drops the
/// message rather than reporting back into the detection flow.
pub trait StatusSink {
    /// Show a short status line
    fn show_status(&mut self, msg: &str);

    /// Show the framing the detector locked onto
    fn show_detected_config(&mut self, config: &FrameConfig);

    /// Show a chunk of text received on the monitored link
    fn show_received_text(&mut self, chunk: &str);
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn show_status(&mut self, msg: &str) {
        (**self).show_status(msg)
    }

    fn show_detected_config(&mut self, config: &FrameConfig) {
        (**self).show_detected_config(config)
    }

    fn show_received_text(&mut self, chunk: &str) {
        (**self).show_received_text(chunk)
    }
}

/// Progress hook called by the search engine before each attempt
pub trait SearchObserver {
    /// `index` is 1-based; `total` is the length of the pass
    fn on_attempt(&mut self, _index: usize, _total: usize, _candidate: &FrameConfig) {}
}

impl SearchObserver for () {}
