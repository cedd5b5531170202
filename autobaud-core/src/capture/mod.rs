//! Pulse capture
//!
//! The interrupt-level side lives in [`recorder`]; this module runs one
//! capture through a [`PulseSource`] and summarizes what came back.

pub mod recorder;

use heapless::Vec;

use crate::config::{CaptureConfig, MAX_PULSE_SAMPLES};
use crate::error::DetectError;
use crate::traits::PulseSource;

pub use recorder::{CaptureGate, EdgeDrain, EdgeQueue, EdgeRecorder, RecordOutcome};

/// Time between two consecutive edges on the receive line (µs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseSample(pub i32);

impl PulseSample {
    pub const fn micros(self) -> i32 {
        self.0
    }
}

/// Bounded buffer of samples in arrival order
pub type PulseBuffer = Vec<PulseSample, MAX_PULSE_SAMPLES>;

/// Result of one capture run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Everything recorded, possibly fewer than requested
    pub samples: PulseBuffer,
    /// Sample count needed for an estimate
    pub min_samples: usize,
}

impl CaptureReport {
    /// Whether enough samples arrived before the capture stopped
    pub fn min_samples_met(&self) -> bool {
        self.samples.len() >= self.min_samples
    }

    /// The samples, or `InsufficientSamples` when the capture came up short
    pub fn into_samples(self) -> Result<PulseBuffer, DetectError> {
        if self.min_samples_met() {
            Ok(self.samples)
        } else {
            Err(DetectError::InsufficientSamples {
                captured: self.samples.len(),
                required: self.min_samples,
            })
        }
    }
}

/// Arm edge capture and wait for it to finish
///
/// Stops at `max_samples` or `timeout_ms`, whichever comes first. A short
/// capture is reported through [`CaptureReport::min_samples_met`] and
/// never retried here.
pub async fn start_capture<S: PulseSource>(source: &mut S, config: &CaptureConfig) -> CaptureReport {
    let max = config.max_samples.min(MAX_PULSE_SAMPLES);
    let mut samples = source.capture(max, config.timeout_ms).await;
    samples.truncate(max);

    debug!("Captured {} pulses (need {})", samples.len(), config.min_samples);

    CaptureReport {
        samples,
        min_samples: config.min_samples,
    }
}

/// Summary statistics of a capture
///
/// A low spread relative to the mean means the line carries a clean,
/// regular signal. `consistency_x100` is mean / std-dev scaled by 100,
/// and zero when every pulse has the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseStats {
    pub samples: usize,
    pub min_us: i32,
    pub max_us: i32,
    pub mean_us: i32,
    pub std_dev_us: u32,
    pub consistency_x100: u32,
}

impl PulseStats {
    /// Compute statistics; `None` for an empty capture
    pub fn from_samples(samples: &[PulseSample]) -> Option<Self> {
        let first = samples.first()?.0;
        let n = samples.len() as i64;

        let mut min = first;
        let mut max = first;
        let mut sum: i64 = 0;
        let mut sum_sq: i64 = 0;
        for s in samples {
            min = min.min(s.0);
            max = max.max(s.0);
            sum += s.0 as i64;
            sum_sq += (s.0 as i64) * (s.0 as i64);
        }

        let mean = sum / n;
        // n² · variance = n·Σx² − (Σx)²
        let scaled_var = (n * sum_sq - sum * sum).max(0) as u64;
        let std_dev = isqrt(scaled_var / (n * n) as u64) as u32;
        let consistency = if std_dev > 0 && mean > 0 {
            (mean as u64 * 100 / std_dev as u64) as u32
        } else {
            0
        };

        Some(Self {
            samples: samples.len(),
            min_us: min,
            max_us: max,
            mean_us: mean as i32,
            std_dev_us: std_dev,
            consistency_x100: consistency,
        })
    }
}

/// Integer square root, rounded down
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
