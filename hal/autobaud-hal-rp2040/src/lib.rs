//! RP2040-specific HAL for the autobaud firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `autobaud-hal` traits:
//!
//! - Reconfigurable receive link on a UART (implements `SerialLink`)
//! - Edge timestamping on the receive pin
//! - Status LED output (implements `OutputPin`)
//! - Flash storage driver (implements `FlashStorage`)

#![no_std]

pub mod flash;
pub mod gpio;
pub mod uart;

// Re-export shared traits from autobaud-hal for convenience
pub use autobaud_hal::{FlashStorage as FlashStorageTrait, OutputPin, SerialLink, StorageKey};
