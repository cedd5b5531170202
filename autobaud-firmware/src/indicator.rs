//! Indicator handing states to the LED task
//!
//! Never waits: the blink pattern runs in the LED task.

use autobaud_core::traits::{Indicator, IndicatorState};

use crate::channels::LED_STATES;

pub struct LedQueue;

impl Indicator for LedQueue {
    fn set_state(&mut self, state: IndicatorState) {
        if LED_STATES.try_send(state).is_err() {
            defmt::trace!("LED queue full, dropped {}", state);
        }
    }
}
