//! Baud rate estimation from pulse widths
//!
//! The narrowest pulse in a capture is taken as one bit time. Its
//! reciprocal is snapped to the nearest standard rate, and the estimate is
//! accepted only within the configured tolerance of that rate.

use crate::candidate::STANDARD_BAUD_RATES;
use crate::capture::PulseSample;
use crate::config::EstimatorConfig;
use crate::error::DetectError;

/// Estimate the baud rate, or `EstimationOutOfTolerance`
///
/// An empty capture or a non-positive narrowest pulse yields
/// `raw_baud = 0`.
pub fn estimate(samples: &[PulseSample], config: &EstimatorConfig) -> Result<u32, DetectError> {
    let w_min = match samples.iter().map(|s| s.micros()).min() {
        Some(w) if w > 0 => w as u32,
        _ => return Err(DetectError::EstimationOutOfTolerance { raw_baud: 0 }),
    };

    let raw_baud = 1_000_000 / w_min;
    let nearest = nearest_standard_rate(raw_baud);

    debug!("Narrowest pulse {} us, raw rate {}, nearest {}", w_min, raw_baud, nearest);

    if within_tolerance(raw_baud, nearest, config.tolerance_permille) {
        info!("Estimated baud rate {}", nearest);
        Ok(nearest)
    } else {
        warn!("Raw rate {} too far from {}", raw_baud, nearest);
        Err(DetectError::EstimationOutOfTolerance { raw_baud })
    }
}

/// [`estimate`] with the error discarded
pub fn estimate_baud(samples: &[PulseSample], config: &EstimatorConfig) -> Option<u32> {
    estimate(samples, config).ok()
}

/// Standard rate closest to `raw`; ties go to the lower rate
pub fn nearest_standard_rate(raw: u32) -> u32 {
    let mut best = STANDARD_BAUD_RATES[0];
    for &rate in &STANDARD_BAUD_RATES[1..] {
        // Strictly closer only, so an exact tie keeps the lower rate
        if raw.abs_diff(rate) < raw.abs_diff(best) {
            best = rate;
        }
    }
    best
}

/// `|raw - nearest| / nearest <= tolerance`, exact in integers
fn within_tolerance(raw: u32, nearest: u32, tolerance_permille: u16) -> bool {
    (raw.abs_diff(nearest) as u64) * 1000 <= (nearest as u64) * (tolerance_permille as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn samples(widths: &[i32]) -> std::vec::Vec<PulseSample> {
        widths.iter().map(|&w| PulseSample(w)).collect()
    }

    #[test]
    fn test_scenario_9600() {
        // 1_000_000 / 104 = 9615, within 10% of 9600
        let s = samples(&[104, 104, 208, 104]);
        assert_eq!(estimate(&s, &EstimatorConfig::default()), Ok(9600));
    }

    #[test]
    fn test_115200() {
        // 1_000_000 / 9 = 111111, 3.5% off
        let s = samples(&[9, 17, 26, 9]);
        assert_eq!(estimate_baud(&s, &EstimatorConfig::default()), Some(115200));
    }

    #[test]
    fn test_out_of_tolerance() {
        // 1_000_000 / 13 = 76923, nearest 57600, 33% off
        let s = samples(&[13, 26]);
        assert_eq!(
            estimate(&s, &EstimatorConfig::default()),
            Err(DetectError::EstimationOutOfTolerance { raw_baud: 76923 })
        );
    }

    #[test]
    fn test_non_positive_width() {
        let config = EstimatorConfig::default();
        assert_eq!(estimate_baud(&samples(&[0, 104]), &config), None);
        assert_eq!(estimate_baud(&samples(&[-5, 104]), &config), None);
        assert_eq!(estimate_baud(&[], &config), None);
    }

    #[test]
    fn test_tie_goes_to_lower_rate() {
        // Halfway between 9600 and 19200
        assert_eq!(nearest_standard_rate(14400), 9600);
        assert_eq!(nearest_standard_rate(14401), 19200);
    }

    #[test]
    fn test_tolerance_boundary_inclusive() {
        // 10% of 9600 is 960
        assert!(within_tolerance(10560, 9600, 100));
        assert!(!within_tolerance(10561, 9600, 100));
        assert!(within_tolerance(8640, 9600, 100));
        assert!(!within_tolerance(8639, 9600, 100));
    }

    #[test]
    fn test_tolerance_configurable() {
        let strict = EstimatorConfig { tolerance_permille: 10 };
        // 9615 is 0.16% off 9600
        assert_eq!(estimate_baud(&samples(&[104]), &strict), Some(9600));
        // 1_000_000 / 100 = 10000 is 4.2% off
        assert_eq!(estimate_baud(&samples(&[100]), &strict), None);
    }

    proptest! {
        #[test]
        fn prop_estimate_is_nearest_within_tolerance(w in 1i32..2000) {
            let raw = 1_000_000 / w as u32;
            let result = estimate_baud(&[PulseSample(w)], &EstimatorConfig::default());

            let nearest = STANDARD_BAUD_RATES
                .iter()
                .copied()
                .min_by_key(|&r| (raw.abs_diff(r), r))
                .unwrap();
            let close = (raw.abs_diff(nearest) as f64) / (nearest as f64) <= 0.10;

            if close {
                prop_assert_eq!(result, Some(nearest));
            } else {
                prop_assert_eq!(result, None);
            }
        }
    }
}
