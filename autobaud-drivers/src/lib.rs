//! Collaborator implementations
//!
//! Concrete implementations of the output traits defined in
//! autobaud-core:
//!
//! - Status LED driven through an [`autobaud_hal::OutputPin`]
//! - Scrolling text console over a [`autobaud_core::traits::DisplayBackend`]

#![no_std]
#![deny(unsafe_code)]

pub mod console;
pub mod led;

pub use console::ScrollConsole;
pub use led::LedIndicator;
