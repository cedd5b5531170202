//! Autobaud Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the detection logic talks to.
//! Chip-specific HALs (currently RP2040) implement them, and the host
//! test suites implement them with scripted mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  autobaud-firmware / autobaud-core      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  autobaud-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ autobaud-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialLink`] - Reconfigurable receive link under test
//! - [`flash::FlashStorage`] - Persistent key-value storage
//! - [`gpio::OutputPin`] - Digital output (status LED)

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::OutputPin;
pub use uart::{DataBits, Parity, SerialLink, StopBits, UartConfig};
