//! Edge capture source

use core::future::Future;

use crate::capture::PulseBuffer;

/// Source of pulse-width samples from the receive line
///
/// Implementations arm edge capture, wait until `max_samples` pulses are
/// recorded or `timeout_ms` elapses, then hand back everything recorded
/// in arrival order. A timeout is not an error; the returned buffer is
/// simply short.
pub trait PulseSource {
    fn capture(
        &mut self,
        max_samples: usize,
        timeout_ms: u32,
    ) -> impl Future<Output = PulseBuffer>;
}
