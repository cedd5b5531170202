//! Status LED indicator
//!
//! - Idle: off
//! - Searching: toggles each time the state is set, so the LED blinks
//!   once per tested candidate
//! - Success, Monitoring: solid on
//! - Error: three short blinks, then off
//!
//! The blink pattern awaits its delays, so the LED is driven from its own
//! task and never stalls detection. The detection side talks to it through
//! the non-blocking [`Indicator`](autobaud_core::traits::Indicator) trait.

use autobaud_core::traits::IndicatorState;
use autobaud_hal::OutputPin;
use embedded_hal_async::delay::DelayNs;

/// Blinks shown when entering the error state
pub const ERROR_BLINKS: u8 = 3;

/// On and off time of one error blink
pub const ERROR_BLINK_MS: u32 = 100;

/// LED on a GPIO pin
pub struct LedIndicator<P, D> {
    pin: P,
    delay: D,
    /// If true, LED on = pin low
    inverted: bool,
    state: IndicatorState,
}

impl<P: OutputPin, D: DelayNs> LedIndicator<P, D> {
    /// Create an indicator; the LED starts off
    ///
    /// - `inverted`: LED is lit when the pin is low
    pub fn new(pin: P, delay: D, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            delay,
            inverted,
            state: IndicatorState::Idle,
        };
        led.set_lit(false);
        led
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    pub fn is_lit(&self) -> bool {
        self.pin.is_set_high() != self.inverted
    }

    fn set_lit(&mut self, lit: bool) {
        self.pin.set_state(lit != self.inverted);
    }

    /// Show `state`, running its pattern to completion
    pub async fn show(&mut self, state: IndicatorState) {
        match state {
            IndicatorState::Idle => self.set_lit(false),
            IndicatorState::Searching => self.pin.toggle(),
            IndicatorState::Success | IndicatorState::Monitoring => self.set_lit(true),
            IndicatorState::Error => {
                for _ in 0..ERROR_BLINKS {
                    self.set_lit(true);
                    self.delay.delay_ms(ERROR_BLINK_MS).await;
                    self.set_lit(false);
                    self.delay.delay_ms(ERROR_BLINK_MS).await;
                }
            }
        }
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    extern crate std;
    use std::vec::Vec;

    /// Mock pin recording every level it was driven to
    struct MockPin {
        high: bool,
        history: Vec<bool>,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                history: Vec::new(),
            }
        }
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
            self.history.push(true);
        }

        fn set_low(&mut self) {
            self.high = false;
            self.history.push(false);
        }

        fn toggle(&mut self) {
            if self.high {
                self.set_low();
            } else {
                self.set_high();
            }
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    /// Delay that only adds up the requested time
    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn test_starts_off() {
        let led = LedIndicator::new(MockPin::new(), MockDelay::default(), false);
        assert!(!led.is_lit());
        assert_eq!(led.state(), IndicatorState::Idle);
    }

    #[test]
    fn test_searching_toggles_per_attempt() {
        let mut led = LedIndicator::new(MockPin::new(), MockDelay::default(), false);
        block_on(led.show(IndicatorState::Searching));
        assert!(led.is_lit());
        block_on(led.show(IndicatorState::Searching));
        assert!(!led.is_lit());
        block_on(led.show(IndicatorState::Searching));
        assert!(led.is_lit());
    }

    #[test]
    fn test_success_and_monitoring_solid() {
        let mut led = LedIndicator::new(MockPin::new(), MockDelay::default(), false);
        block_on(led.show(IndicatorState::Success));
        assert!(led.is_lit());
        block_on(led.show(IndicatorState::Monitoring));
        assert!(led.is_lit());
        block_on(led.show(IndicatorState::Idle));
        assert!(!led.is_lit());
    }

    #[test]
    fn test_error_blinks_three_times_then_off() {
        let mut led = LedIndicator::new(MockPin::new(), MockDelay::default(), false);
        block_on(led.show(IndicatorState::Monitoring));
        led.pin.history.clear();

        block_on(led.show(IndicatorState::Error));

        assert_eq!(led.pin.history, [true, false, true, false, true, false]);
        assert!(!led.is_lit());
        assert_eq!(led.delay.total_ns, 6 * ERROR_BLINK_MS as u64 * 1_000_000);
        assert_eq!(led.state(), IndicatorState::Error);
    }

    #[test]
    fn test_inverted_pin() {
        let mut led = LedIndicator::new(MockPin::new(), MockDelay::default(), true);
        assert!(led.pin.is_set_high());
        block_on(led.show(IndicatorState::Success));
        assert!(!led.pin.is_set_high());
        assert!(led.is_lit());
    }
}
