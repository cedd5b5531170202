//! Millisecond clock over the embassy time driver

use embassy_time::Instant;

use autobaud_core::traits::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
