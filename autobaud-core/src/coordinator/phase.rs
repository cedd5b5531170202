//! Escalation phases
//!
//! The coordinator is a finite state machine. Each phase does one piece of
//! work and reports an event; the next phase is a pure function of the
//! current phase, the event and the escalation switches.

use crate::candidate::FrameConfig;

/// Coordinator phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Read the cached framing from flash
    LoadCache,
    /// Test the cached framing against the live signal
    VerifyCache(FrameConfig),
    /// Capture pulse widths and estimate the baud rate
    DetectBaud,
    /// Try the 12 framings of the estimated rate
    ReducedSearch(u32),
    /// Brute-force every remaining standard candidate
    FullSearch,
    /// Locked; the monitor loop takes over
    Monitoring(FrameConfig),
    /// Nothing matched; waits for an explicit restart
    Failed,
}

/// Results reported by a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    /// A usable record was found in the cache
    CacheHit(FrameConfig),
    /// Cache empty or unusable
    CacheMiss,
    /// Pulse estimation produced a standard rate
    BaudEstimated(u32),
    /// Too few pulses or no rate within tolerance
    EstimationFailed,
    /// A search pass accepted a candidate
    Accepted(FrameConfig),
    /// A search pass ran out of candidates
    SearchFailed,
    /// Operator asked to start over
    Restart,
}

/// Escalation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Escalation {
    /// Run pulse estimation before brute force
    pub use_baud_detection: bool,
    /// Continue with the full search after a failed reduced search
    pub fallback_to_full: bool,
}

impl Default for Escalation {
    fn default() -> Self {
        Self {
            use_baud_detection: true,
            fallback_to_full: true,
        }
    }
}

impl Phase {
    /// Whether the coordinator stops in this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Monitoring(_) | Phase::Failed)
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: PhaseEvent, escalation: &Escalation) -> Self {
        use Phase::*;
        use PhaseEvent::*;

        let after_cache = if escalation.use_baud_detection {
            DetectBaud
        } else {
            FullSearch
        };

        match (self, event) {
            (LoadCache, CacheHit(config)) => VerifyCache(config),
            (LoadCache, CacheMiss) => after_cache,

            // Cache is discarded for this run only
            (VerifyCache(_), Accepted(config)) => Monitoring(config),
            (VerifyCache(_), SearchFailed) => after_cache,

            (DetectBaud, BaudEstimated(baud)) => ReducedSearch(baud),
            (DetectBaud, EstimationFailed) => FullSearch,

            (ReducedSearch(_), Accepted(config)) => Monitoring(config),
            (ReducedSearch(_), SearchFailed) => {
                if escalation.fallback_to_full {
                    FullSearch
                } else {
                    Failed
                }
            }

            (FullSearch, Accepted(config)) => Monitoring(config),
            (FullSearch, SearchFailed) => Failed,

            (Monitoring(_), Restart) | (Failed, Restart) => LoadCache,

            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{DataBits, Parity, StopBits};

    fn frame() -> FrameConfig {
        FrameConfig::new(115200, DataBits::Eight, Parity::None, StopBits::One).unwrap()
    }

    #[test]
    fn test_cache_hit_flow() {
        let esc = Escalation::default();
        let phase = Phase::LoadCache.transition(PhaseEvent::CacheHit(frame()), &esc);
        assert_eq!(phase, Phase::VerifyCache(frame()));
        let phase = phase.transition(PhaseEvent::Accepted(frame()), &esc);
        assert_eq!(phase, Phase::Monitoring(frame()));
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_full_escalation_path() {
        let esc = Escalation::default();
        let mut phase = Phase::LoadCache;
        for (event, expected) in [
            (PhaseEvent::CacheHit(frame()), Phase::VerifyCache(frame())),
            (PhaseEvent::SearchFailed, Phase::DetectBaud),
            (PhaseEvent::BaudEstimated(57600), Phase::ReducedSearch(57600)),
            (PhaseEvent::SearchFailed, Phase::FullSearch),
            (PhaseEvent::SearchFailed, Phase::Failed),
        ] {
            phase = phase.transition(event, &esc);
            assert_eq!(phase, expected);
        }
    }

    #[test]
    fn test_estimation_failure_skips_reduced_search() {
        let esc = Escalation::default();
        let next = Phase::DetectBaud.transition(PhaseEvent::EstimationFailed, &esc);
        assert_eq!(next, Phase::FullSearch);
    }

    #[test]
    fn test_switches() {
        let no_detect = Escalation {
            use_baud_detection: false,
            fallback_to_full: true,
        };
        assert_eq!(
            Phase::LoadCache.transition(PhaseEvent::CacheMiss, &no_detect),
            Phase::FullSearch
        );

        let no_fallback = Escalation {
            use_baud_detection: true,
            fallback_to_full: false,
        };
        assert_eq!(
            Phase::ReducedSearch(9600).transition(PhaseEvent::SearchFailed, &no_fallback),
            Phase::Failed
        );
    }

    #[test]
    fn test_failed_only_leaves_on_restart() {
        let esc = Escalation::default();
        for event in [
            PhaseEvent::CacheMiss,
            PhaseEvent::SearchFailed,
            PhaseEvent::Accepted(frame()),
        ] {
            assert_eq!(Phase::Failed.transition(event, &esc), Phase::Failed);
        }
        assert_eq!(Phase::Failed.transition(PhaseEvent::Restart, &esc), Phase::LoadCache);
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let esc = Escalation::default();
        assert_eq!(
            Phase::FullSearch.transition(PhaseEvent::BaudEstimated(9600), &esc),
            Phase::FullSearch
        );
    }
}
