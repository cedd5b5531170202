//! Pulse source backed by the edge capture task

use embassy_time::{with_timeout, Duration};

use autobaud_core::capture::recorder::EdgeDrain;
use autobaud_core::capture::PulseBuffer;
use autobaud_core::traits::PulseSource;

use crate::channels::{CAPTURE_ARMED, CAPTURE_DONE};

/// Consumer side of the edge queue
pub struct EdgePulses {
    drain: EdgeDrain<'static>,
}

impl EdgePulses {
    pub fn new(drain: EdgeDrain<'static>) -> Self {
        Self { drain }
    }
}

impl PulseSource for EdgePulses {
    async fn capture(&mut self, max_samples: usize, timeout_ms: u32) -> PulseBuffer {
        CAPTURE_DONE.reset();
        self.drain.arm(max_samples);
        CAPTURE_ARMED.signal(());

        let window = Duration::from_millis(timeout_ms as u64);
        if with_timeout(window, CAPTURE_DONE.wait()).await.is_err() {
            defmt::debug!("Pulse capture timed out");
        }

        self.drain.finish()
    }
}
