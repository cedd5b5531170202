//! Board-agnostic serial framing detection
//!
//! This crate contains all detection logic that does not depend on a
//! specific board:
//!
//! - Pulse capture bookkeeping and the lock-free edge recorder
//! - Baud estimation from pulse widths
//! - Candidate framing enumeration
//! - Printable-text validation
//! - Candidate search over a serial link
//! - Persistent cache of the last accepted framing
//! - Escalation from cache to reduced to full search
//! - Live monitoring of the locked link
//! - Configuration types and parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod cache;
pub mod candidate;
pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod estimator;
pub mod monitor;
pub mod search;
pub mod traits;
pub mod validator;

#[cfg(test)]
mod testing;

pub use candidate::{CandidateError, CandidateList, FrameConfig};
pub use error::DetectError;
