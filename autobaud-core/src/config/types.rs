//! Detector configuration types
//!
//! Every threshold and timeout the detector uses lives here with the
//! defaults the device ships with. Ratios are per-mille integers so the
//! boundaries stay exact without floating point.

use heapless::Vec;

use crate::candidate::STANDARD_BAUD_RATES;

/// Capacity of the pulse capture buffer
pub const MAX_PULSE_SAMPLES: usize = 64;

/// Capacity of one sample window in bytes
pub const MAX_WINDOW_LEN: usize = 128;

/// Maximum number of baud rates in a fast-mode list
pub const MAX_FAST_BAUDS: usize = STANDARD_BAUD_RATES.len();

/// Pulse capture parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureConfig {
    /// Samples needed before an estimate is attempted
    pub min_samples: usize,
    /// Capture stops once this many samples are recorded
    pub max_samples: usize,
    /// Capture stops after this long even if `max_samples` is not reached
    pub timeout_ms: u32,
    /// Narrowest pulse accepted by the recorder (µs)
    pub min_pulse_us: u32,
    /// Widest pulse accepted by the recorder (µs)
    pub max_pulse_us: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            max_samples: 50,
            timeout_ms: 5000,
            min_pulse_us: 1,
            max_pulse_us: 1_000_000,
        }
    }
}

/// Baud estimator parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EstimatorConfig {
    /// Accepted relative distance from the nearest standard rate (‰)
    pub tolerance_permille: u16,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            tolerance_permille: 100,
        }
    }
}

/// Printable-text validator parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidatorConfig {
    /// Minimum printable ratio for acceptance (‰, inclusive)
    pub threshold_permille: u16,
    /// Windows shorter than this are inconclusive
    pub min_len: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            threshold_permille: 850,
            min_len: 10,
        }
    }
}

/// Candidate search and escalation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SearchConfig {
    /// Time budget for one candidate's sample window
    pub per_candidate_timeout_ms: u32,
    /// A window closes early once it holds this many bytes
    pub target_len: usize,
    /// Run pulse-width estimation before brute force
    pub use_baud_detection: bool,
    /// Escalate to the full search when the reduced search fails
    pub fallback_to_full: bool,
    /// Restrict the full search to 8N1 at `fast_bauds`
    pub fast_mode: bool,
    /// Baud rates tried in fast mode
    pub fast_bauds: Vec<u32, MAX_FAST_BAUDS>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut fast_bauds = Vec::new();
        let _ = fast_bauds.push(9600);
        let _ = fast_bauds.push(115200);
        Self {
            per_candidate_timeout_ms: 1000,
            target_len: 64,
            use_baud_detection: true,
            fallback_to_full: true,
            fast_mode: false,
            fast_bauds,
        }
    }
}

/// Monitor loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    /// Timeout of each link read while monitoring
    pub poll_timeout_ms: u32,
    /// Cadence of the reclamation pass
    pub reclaim_interval_ms: u32,
    /// Forward non-text chunks as hex instead of dropping them
    pub show_hex: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 10,
            reclaim_interval_ms: 1000,
            show_hex: true,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetectorConfig {
    pub capture: CaptureConfig,
    pub estimator: EstimatorConfig,
    pub validator: ValidatorConfig,
    pub search: SearchConfig,
    pub monitor: MonitorConfig,
}

/// Reasons a configuration is internally inconsistent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `max_samples` is zero or exceeds the capture buffer
    MaxSamples,
    /// `min_samples` is zero or above `max_samples`
    MinSamples,
    /// Pulse range is empty
    PulseRange,
    /// A per-mille value exceeds 1000
    Permille,
    /// `min_len`/`target_len` do not fit a sample window
    WindowLength,
    /// A timeout or interval is zero
    ZeroDuration,
    /// Fast mode enabled with no usable baud rate
    FastBauds,
}

impl DetectorConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.capture;
        if c.max_samples == 0 || c.max_samples > MAX_PULSE_SAMPLES {
            return Err(ConfigError::MaxSamples);
        }
        if c.min_samples == 0 || c.min_samples > c.max_samples {
            return Err(ConfigError::MinSamples);
        }
        if c.min_pulse_us == 0 || c.min_pulse_us > c.max_pulse_us {
            return Err(ConfigError::PulseRange);
        }
        if self.estimator.tolerance_permille > 1000 || self.validator.threshold_permille > 1000 {
            return Err(ConfigError::Permille);
        }
        let v = &self.validator;
        let s = &self.search;
        if v.min_len == 0
            || v.min_len > MAX_WINDOW_LEN
            || s.target_len < v.min_len
            || s.target_len > MAX_WINDOW_LEN
        {
            return Err(ConfigError::WindowLength);
        }
        if c.timeout_ms == 0
            || s.per_candidate_timeout_ms == 0
            || self.monitor.poll_timeout_ms == 0
            || self.monitor.reclaim_interval_ms == 0
        {
            return Err(ConfigError::ZeroDuration);
        }
        if s.fast_mode && s.fast_bauds.iter().all(|&b| b == 0) {
            return Err(ConfigError::FastBauds);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_values() {
        let config = DetectorConfig::default();
        assert_eq!(config.capture.min_samples, 10);
        assert_eq!(config.capture.max_samples, 50);
        assert_eq!(config.capture.timeout_ms, 5000);
        assert_eq!(config.estimator.tolerance_permille, 100);
        assert_eq!(config.validator.threshold_permille, 850);
        assert_eq!(config.search.per_candidate_timeout_ms, 1000);
        assert_eq!(config.search.fast_bauds.as_slice(), &[9600, 115200]);
        assert_eq!(config.monitor.reclaim_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_capture() {
        let mut config = DetectorConfig::default();
        config.capture.max_samples = MAX_PULSE_SAMPLES + 1;
        assert_eq!(config.validate(), Err(ConfigError::MaxSamples));
    }

    #[test]
    fn test_validate_rejects_min_above_max() {
        let mut config = DetectorConfig::default();
        config.capture.min_samples = 60;
        assert_eq!(config.validate(), Err(ConfigError::MinSamples));
    }

    #[test]
    fn test_validate_rejects_target_below_min_len() {
        let mut config = DetectorConfig::default();
        config.search.target_len = 4;
        assert_eq!(config.validate(), Err(ConfigError::WindowLength));
    }

    #[test]
    fn test_validate_rejects_threshold_above_one() {
        let mut config = DetectorConfig::default();
        config.validator.threshold_permille = 1001;
        assert_eq!(config.validate(), Err(ConfigError::Permille));
    }
}
