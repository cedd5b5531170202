//! Build script for autobaud-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates autobaud.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in each section, with their expected kind
const SCHEMA: &[(&str, &[(&str, Kind)])] = &[
    (
        "capture",
        &[
            ("min_samples", Kind::Int),
            ("max_samples", Kind::Int),
            ("timeout_ms", Kind::Int),
            ("min_pulse_us", Kind::Int),
            ("max_pulse_us", Kind::Int),
        ],
    ),
    ("estimator", &[("tolerance_permille", Kind::Int)]),
    (
        "validator",
        &[("threshold_permille", Kind::Int), ("min_len", Kind::Int)],
    ),
    (
        "search",
        &[
            ("per_candidate_timeout_ms", Kind::Int),
            ("target_len", Kind::Int),
            ("use_baud_detection", Kind::Bool),
            ("fallback_to_full", Kind::Bool),
            ("fast_mode", Kind::Bool),
            ("fast_bauds", Kind::IntArray),
        ],
    ),
    (
        "monitor",
        &[
            ("poll_timeout_ms", Kind::Int),
            ("reclaim_interval_ms", Kind::Int),
            ("show_hex", Kind::Bool),
        ],
    ),
];

/// Mirrors the capture buffer capacity in autobaud-core
const MAX_PULSE_SAMPLES: i64 = 64;

/// Mirrors the sample window capacity in autobaud-core
const MAX_WINDOW_LEN: i64 = 128;

#[derive(Clone, Copy)]
enum Kind {
    Int,
    Bool,
    IntArray,
}

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate autobaud.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=autobaud.toml");

    let config_path = Path::new("autobaud.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: autobaud.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds autobaud.toml as its detector settings.     ║\n\
            ║  Please create one in the autobaud-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read autobaud.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in autobaud.toml                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_schema(&config, &mut errors);
    validate_ranges(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid settings in autobaud.toml                        ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=autobaud.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reject unknown sections and keys and check value kinds
///
/// The on-target parser is a line-oriented subset, so anything it would
/// refuse is caught here first.
fn validate_schema(config: &toml::Value, errors: &mut Vec<String>) {
    let root = match config {
        toml::Value::Table(t) => t,
        _ => return,
    };

    for (section, body) in root {
        let Some((_, keys)) = SCHEMA.iter().find(|(name, _)| name == section) else {
            errors.push(format!("Unknown section [{}]", section));
            continue;
        };
        let body = match body {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("'{}' must be a [section]", section));
                continue;
            }
        };

        for (key, value) in body {
            let Some((_, kind)) = keys.iter().find(|(name, _)| name == key) else {
                errors.push(format!("[{}] unknown key '{}'", section, key));
                continue;
            };
            let ok = match (kind, value) {
                (Kind::Int, toml::Value::Integer(n)) => *n >= 0,
                (Kind::Bool, toml::Value::Boolean(_)) => true,
                (Kind::IntArray, toml::Value::Array(items)) => items
                    .iter()
                    .all(|v| matches!(v, toml::Value::Integer(n) if *n >= 0)),
                _ => false,
            };
            if !ok {
                errors.push(format!("[{}] '{}' has the wrong type", section, key));
            }
        }
    }
}

fn int(config: &toml::Value, section: &str, key: &str) -> Option<i64> {
    config.get(section)?.get(key)?.as_integer()
}

/// Cross-field checks matching DetectorConfig::validate
fn validate_ranges(config: &toml::Value, errors: &mut Vec<String>) {
    let max_samples = int(config, "capture", "max_samples").unwrap_or(50);
    let min_samples = int(config, "capture", "min_samples").unwrap_or(10);
    if max_samples == 0 || max_samples > MAX_PULSE_SAMPLES {
        errors.push(format!("[capture] max_samples must be 1-{}", MAX_PULSE_SAMPLES));
    }
    if min_samples == 0 || min_samples > max_samples {
        errors.push("[capture] min_samples must be 1..=max_samples".to_string());
    }

    let min_pulse = int(config, "capture", "min_pulse_us").unwrap_or(1);
    let max_pulse = int(config, "capture", "max_pulse_us").unwrap_or(1_000_000);
    if min_pulse == 0 || min_pulse > max_pulse {
        errors.push("[capture] min_pulse_us must be 1..=max_pulse_us".to_string());
    }

    for (section, key) in [
        ("estimator", "tolerance_permille"),
        ("validator", "threshold_permille"),
    ] {
        if int(config, section, key).is_some_and(|v| v > 1000) {
            errors.push(format!("[{}] {} must be 0-1000", section, key));
        }
    }

    let min_len = int(config, "validator", "min_len").unwrap_or(10);
    let target_len = int(config, "search", "target_len").unwrap_or(64);
    if min_len == 0 || min_len > MAX_WINDOW_LEN {
        errors.push(format!("[validator] min_len must be 1-{}", MAX_WINDOW_LEN));
    }
    if target_len < min_len || target_len > MAX_WINDOW_LEN {
        errors.push(format!(
            "[search] target_len must be min_len..={}",
            MAX_WINDOW_LEN
        ));
    }

    for (section, key) in [
        ("capture", "timeout_ms"),
        ("search", "per_candidate_timeout_ms"),
        ("monitor", "poll_timeout_ms"),
        ("monitor", "reclaim_interval_ms"),
    ] {
        if int(config, section, key) == Some(0) {
            errors.push(format!("[{}] {} must be non-zero", section, key));
        }
    }

    let fast_mode = config
        .get("search")
        .and_then(|s| s.get("fast_mode"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if let Some(toml::Value::Array(bauds)) = config.get("search").and_then(|s| s.get("fast_bauds")) {
        if bauds.len() > 8 {
            errors.push("[search] fast_bauds holds at most 8 rates".to_string());
        }
        if fast_mode && bauds.iter().all(|b| b.as_integer().unwrap_or(0) == 0) {
            errors.push("[search] fast_mode needs a non-zero rate in fast_bauds".to_string());
        }
    }
}
