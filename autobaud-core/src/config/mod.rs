//! Configuration types
//!
//! Detector tunables with shipped defaults, plus the no_std parser for the
//! TOML subset the firmware embeds.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
