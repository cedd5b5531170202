//! Detection error taxonomy
//!
//! Every kind except [`DetectError::AllPhasesExhausted`] is recoverable and
//! only moves the coordinator to its next escalation phase.

use crate::coordinator::Phase;

/// Reasons a detection step did not produce a locked configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectError {
    /// Pulse capture timed out before the minimum sample count
    InsufficientSamples {
        /// Samples collected before the capture stopped
        captured: usize,
        /// Minimum needed for an estimate
        required: usize,
    },
    /// No standard baud rate lies within the tolerance band
    EstimationOutOfTolerance {
        /// Baud rate computed from the narrowest pulse (0 if the pulse was invalid)
        raw_baud: u32,
    },
    /// Sample window below the minimum length; says nothing about the framing
    ValidationTooShort {
        /// Bytes in the window
        len: usize,
        /// Minimum required length
        required: usize,
    },
    /// Validator ran to completion and the printable ratio was too low
    ConfigurationRejected {
        /// Printable ratio in per-mille
        ratio_permille: u16,
    },
    /// Every candidate of one phase was tried without acceptance
    SearchExhausted {
        /// Phase that ran out of candidates
        phase: Phase,
    },
    /// Cache, reduced and full search all failed; terminal for this cycle
    AllPhasesExhausted,
}

impl DetectError {
    /// Whether this error ends the detection cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, DetectError::AllPhasesExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_all_phases_is_terminal() {
        assert!(DetectError::AllPhasesExhausted.is_terminal());
        assert!(!DetectError::InsufficientSamples {
            captured: 1,
            required: 5
        }
        .is_terminal());
        assert!(!DetectError::SearchExhausted {
            phase: Phase::FullSearch
        }
        .is_terminal());
    }
}
