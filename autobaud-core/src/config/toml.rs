//! Minimal TOML parser for detector configuration
//!
//! Handles only the subset `autobaud.toml` uses and needs no allocator.
//!
//! Supported features:
//! - `[section]` headers
//! - `key = value` pairs with integer, boolean or integer-array values
//! - Underscore digit separators (`1_000_000`)
//! - Comments (# ...)
//!
//! NOT supported:
//! - Strings, floats, datetimes
//! - Dotted keys, inline tables, nested arrays

use heapless::Vec;

use super::types::{ConfigError, DetectorConfig, MAX_FAST_BAUDS};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection { line: usize },
    /// Line is not `key = value`
    InvalidLine { line: usize },
    /// Key not valid in its section
    UnknownKey { line: usize },
    /// Value has the wrong type or does not fit
    InvalidValue { line: usize },
    /// Array longer than its fixed capacity
    TooManyItems { line: usize },
    /// Parsed values violate a cross-field constraint
    Invalid(ConfigError),
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Capture,
    Estimator,
    Validator,
    Search,
    Monitor,
}

/// Parse TOML text into a validated [`DetectorConfig`]
///
/// Keys that are absent keep their default values.
pub fn parse_config(input: &str) -> Result<DetectorConfig, ParseError> {
    let mut config = DetectorConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or(ParseError::InvalidSection { line: line_no })?;
            section = parse_section_header(name.trim())
                .ok_or(ParseError::InvalidSection { line: line_no })?;
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or(ParseError::InvalidLine { line: line_no })?;
        apply_value(&mut config, section, key.trim(), value.trim(), line_no)?;
    }

    config.validate().map_err(ParseError::Invalid)?;
    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_section_header(name: &str) -> Option<Section> {
    match name {
        "capture" => Some(Section::Capture),
        "estimator" => Some(Section::Estimator),
        "validator" => Some(Section::Validator),
        "search" => Some(Section::Search),
        "monitor" => Some(Section::Monitor),
        _ => None,
    }
}

fn apply_value(
    config: &mut DetectorConfig,
    section: Section,
    key: &str,
    value: &str,
    line: usize,
) -> Result<(), ParseError> {
    let invalid = ParseError::InvalidValue { line };

    match (section, key) {
        (Section::Capture, "min_samples") => {
            config.capture.min_samples = parse_int(value).ok_or(invalid)?
        }
        (Section::Capture, "max_samples") => {
            config.capture.max_samples = parse_int(value).ok_or(invalid)?
        }
        (Section::Capture, "timeout_ms") => {
            config.capture.timeout_ms = parse_int(value).ok_or(invalid)?
        }
        (Section::Capture, "min_pulse_us") => {
            config.capture.min_pulse_us = parse_int(value).ok_or(invalid)?
        }
        (Section::Capture, "max_pulse_us") => {
            config.capture.max_pulse_us = parse_int(value).ok_or(invalid)?
        }

        (Section::Estimator, "tolerance_permille") => {
            config.estimator.tolerance_permille = parse_int(value).ok_or(invalid)?
        }

        (Section::Validator, "threshold_permille") => {
            config.validator.threshold_permille = parse_int(value).ok_or(invalid)?
        }
        (Section::Validator, "min_len") => {
            config.validator.min_len = parse_int(value).ok_or(invalid)?
        }

        (Section::Search, "per_candidate_timeout_ms") => {
            config.search.per_candidate_timeout_ms = parse_int(value).ok_or(invalid)?
        }
        (Section::Search, "target_len") => {
            config.search.target_len = parse_int(value).ok_or(invalid)?
        }
        (Section::Search, "use_baud_detection") => {
            config.search.use_baud_detection = parse_bool(value).ok_or(invalid)?
        }
        (Section::Search, "fallback_to_full") => {
            config.search.fallback_to_full = parse_bool(value).ok_or(invalid)?
        }
        (Section::Search, "fast_mode") => {
            config.search.fast_mode = parse_bool(value).ok_or(invalid)?
        }
        (Section::Search, "fast_bauds") => {
            config.search.fast_bauds = parse_int_array(value, line)?
        }

        (Section::Monitor, "poll_timeout_ms") => {
            config.monitor.poll_timeout_ms = parse_int(value).ok_or(invalid)?
        }
        (Section::Monitor, "reclaim_interval_ms") => {
            config.monitor.reclaim_interval_ms = parse_int(value).ok_or(invalid)?
        }
        (Section::Monitor, "show_hex") => {
            config.monitor.show_hex = parse_bool(value).ok_or(invalid)?
        }

        _ => return Err(ParseError::UnknownKey { line }),
    }

    Ok(())
}

/// Parse a non-negative integer, allowing `_` separators
fn parse_int<T: TryFrom<u64>>(value: &str) -> Option<T> {
    let mut acc: u64 = 0;
    let mut digits = 0;
    for c in value.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(10)?;
        acc = acc.checked_mul(10)?.checked_add(d as u64)?;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    T::try_from(acc).ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_int_array(value: &str, line: usize) -> Result<Vec<u32, MAX_FAST_BAUDS>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue { line })?;

    let mut items = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let n = parse_int(item).ok_or(ParseError::InvalidValue { line })?;
        items
            .push(n)
            .map_err(|_| ParseError::TooManyItems { line })?;
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Autobaud detector settings
[capture]
min_samples = 5
max_samples = 40
timeout_ms = 2_000

[validator]
threshold_permille = 900   # stricter than default

[search]
fast_mode = true
fast_bauds = [9600, 57600, 115200]

[monitor]
show_hex = false
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.capture.min_samples, 5);
        assert_eq!(config.capture.max_samples, 40);
        assert_eq!(config.capture.timeout_ms, 2000);
        assert_eq!(config.validator.threshold_permille, 900);
        assert!(config.search.fast_mode);
        assert_eq!(config.search.fast_bauds.as_slice(), &[9600, 57600, 115200]);
        assert!(!config.monitor.show_hex);
        // Untouched keys keep defaults
        assert_eq!(config.estimator.tolerance_permille, 100);
        assert_eq!(config.search.per_candidate_timeout_ms, 1000);
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), DetectorConfig::default());
    }

    #[test]
    fn test_unknown_section() {
        let err = parse_config("[display]\nwidth = 128\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidSection { line: 1 });
    }

    #[test]
    fn test_unknown_key() {
        let err = parse_config("[capture]\nsamples = 3\n").unwrap_err();
        assert_eq!(err, ParseError::UnknownKey { line: 2 });
    }

    #[test]
    fn test_key_outside_section() {
        let err = parse_config("min_samples = 3\n").unwrap_err();
        assert_eq!(err, ParseError::UnknownKey { line: 1 });
    }

    #[test]
    fn test_invalid_value_types() {
        assert_eq!(
            parse_config("[monitor]\nshow_hex = yes\n").unwrap_err(),
            ParseError::InvalidValue { line: 2 }
        );
        assert_eq!(
            parse_config("[capture]\nmin_samples = -1\n").unwrap_err(),
            ParseError::InvalidValue { line: 2 }
        );
        assert_eq!(
            parse_config("[estimator]\ntolerance_permille = 70000\n").unwrap_err(),
            ParseError::InvalidValue { line: 2 }
        );
    }

    #[test]
    fn test_array_overflow() {
        let input = "[search]\nfast_bauds = [1, 2, 3, 4, 5, 6, 7, 8, 9]\n";
        assert_eq!(
            parse_config(input).unwrap_err(),
            ParseError::TooManyItems { line: 2 }
        );
    }

    #[test]
    fn test_cross_field_validation() {
        let input = "[capture]\nmin_samples = 30\nmax_samples = 20\n";
        assert_eq!(
            parse_config(input).unwrap_err(),
            ParseError::Invalid(ConfigError::MinSamples)
        );
    }

    #[test]
    fn test_missing_equals() {
        assert_eq!(
            parse_config("[capture]\nmin_samples 3\n").unwrap_err(),
            ParseError::InvalidLine { line: 2 }
        );
    }
}
