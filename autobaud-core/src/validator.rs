//! Printable-text validator
//!
//! A window "looks like text" when enough of its bytes are printable ASCII
//! or common whitespace. A wrong framing decodes into mostly control and
//! high-bit bytes, so the ratio separates good and bad candidates well.

use crate::config::ValidatorConfig;
use crate::error::DetectError;

/// Verdict on one sample window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validation {
    /// Ratio at or above the threshold
    Accepted { ratio_permille: u16 },
    /// Ratio below the threshold
    Rejected { ratio_permille: u16 },
    /// Window shorter than the minimum; says nothing about the framing
    TooShort { len: usize },
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted { .. })
    }

    /// Map to the error taxonomy; `Ok` when accepted
    pub fn into_result(self, config: &ValidatorConfig) -> Result<(), DetectError> {
        match self {
            Validation::Accepted { .. } => Ok(()),
            Validation::Rejected { ratio_permille } => {
                Err(DetectError::ConfigurationRejected { ratio_permille })
            }
            Validation::TooShort { len } => Err(DetectError::ValidationTooShort {
                len,
                required: config.min_len,
            }),
        }
    }
}

/// Printable ASCII, tab, CR or LF
pub const fn is_printable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7E | b'\t' | b'\r' | b'\n')
}

/// Count of printable bytes
pub fn printable_count(sample: &[u8]) -> usize {
    sample.iter().filter(|&&b| is_printable(b)).count()
}

/// Printable ratio in per-mille, rounded down; zero for an empty sample
pub fn printable_ratio_permille(sample: &[u8]) -> u16 {
    if sample.is_empty() {
        return 0;
    }
    (printable_count(sample) * 1000 / sample.len()) as u16
}

/// Score a sample window
///
/// The threshold comparison is done on exact counts, so a ratio of
/// exactly the threshold is accepted.
pub fn validate(sample: &[u8], config: &ValidatorConfig) -> Validation {
    if sample.len() < config.min_len {
        return Validation::TooShort { len: sample.len() };
    }

    let printable = printable_count(sample);
    let ratio_permille = printable_ratio_permille(sample);

    if printable * 1000 >= config.threshold_permille as usize * sample.len() {
        Validation::Accepted { ratio_permille }
    } else {
        Validation::Rejected { ratio_permille }
    }
}

/// Whether the sample is accepted as text
pub fn looks_like_text(sample: &[u8], config: &ValidatorConfig) -> bool {
    validate(sample, config).is_accepted()
}
