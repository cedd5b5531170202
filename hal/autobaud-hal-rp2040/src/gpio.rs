//! GPIO wrappers
//!
//! Adapts embassy-rp pins to the `autobaud-hal` traits and timestamps
//! edges on the receive pin for pulse capture.

use embassy_rp::gpio::{Input, Level, Output, Pin, Pull};
use embassy_rp::Peri;
use embassy_time::Instant;

/// Push-pull output driving the status LED
pub struct LedPin<'d> {
    output: Output<'d>,
}

impl<'d> LedPin<'d> {
    /// Create an LED output, initially low
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            output: Output::new(pin, Level::Low),
        }
    }
}

impl<'d> autobaud_hal::OutputPin for LedPin<'d> {
    fn set_high(&mut self) {
        self.output.set_high();
    }

    fn set_low(&mut self) {
        self.output.set_low();
    }

    fn toggle(&mut self) {
        self.output.toggle();
    }

    fn is_set_high(&self) -> bool {
        self.output.is_set_high()
    }
}

/// Edge timestamper on the serial receive pin
///
/// The RP2040 routes pad input to SIO edge detection whatever function
/// the pin is muxed to, so this keeps working while the UART owns the
/// pin. Build it before the UART so the UART's function select wins.
pub struct EdgeInput<'d> {
    input: Input<'d>,
}

impl<'d> EdgeInput<'d> {
    /// Create an edge input with the pull-up idle level of a UART line
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            input: Input::new(pin, Pull::Up),
        }
    }

    /// Wait for the next transition and return its time in microseconds
    ///
    /// The value wraps roughly every 71 minutes; consumers work with
    /// wrapping differences only.
    pub async fn next_edge_us(&mut self) -> u32 {
        self.input.wait_for_any_edge().await;
        Instant::now().as_micros() as u32
    }

    /// Current line level
    pub fn is_high(&self) -> bool {
        self.input.is_high()
    }
}
