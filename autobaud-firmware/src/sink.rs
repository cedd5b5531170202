//! Status sink writing to the defmt log
//!
//! The board has no display, so every status line goes out over RTT.

use defmt::*;

use autobaud_core::candidate::{FrameConfig, Parity};
use autobaud_core::traits::StatusSink;

pub struct LogSink;

impl StatusSink for LogSink {
    fn show_status(&mut self, msg: &str) {
        info!("{}", msg);
    }

    fn show_detected_config(&mut self, config: &FrameConfig) {
        let parity = match config.parity() {
            Parity::None => "NONE",
            Parity::Even => "EVEN",
            Parity::Odd => "ODD",
        };
        info!("Baud: {}", config.baud_rate());
        info!("Data: {} bits", config.data_bits().bits());
        info!("Parity: {}", parity);
        info!("Stop: {}", config.stop_bits().bits());
    }

    fn show_received_text(&mut self, chunk: &str) {
        println!("{}", chunk);
    }
}
