//! UART link abstractions
//!
//! The link under test is receive-only from the detector's point of view:
//! it is reconfigured for each candidate framing and then drained for a
//! bounded time.

use core::future::Future;

/// UART line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits per frame
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

impl DataBits {
    /// Bit count as a plain integer
    pub const fn bits(self) -> u8 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }

    /// Create from a bit count
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            7 => Some(DataBits::Seven),
            8 => Some(DataBits::Eight),
            _ => None,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    /// Single-letter form used in "8N1" style labels
    pub const fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        }
    }

    /// Stable numeric code for persisted records
    pub const fn code(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Even => 1,
            Parity::Odd => 2,
        }
    }

    /// Decode a persisted parity code
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Parity::None),
            1 => Some(Parity::Even),
            2 => Some(Parity::Odd),
            _ => None,
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Stop bit count as a plain integer
    pub const fn bits(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }

    /// Create from a stop bit count
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(StopBits::One),
            2 => Some(StopBits::Two),
            _ => None,
        }
    }
}

/// Receive link whose framing can be changed at runtime
///
/// Only one configuration is ever active: `configure` replaces the
/// previous one and discards anything received under it.
pub trait SerialLink {
    /// Error type for link operations
    type Error;

    /// Apply a new line configuration
    ///
    /// Implementations must drop bytes buffered under the previous
    /// configuration so the next read only sees data framed with `config`.
    fn configure(&mut self, config: &UartConfig) -> Result<(), Self::Error>;

    /// Read whatever bytes arrive within `timeout_ms`
    ///
    /// Returns the number of bytes written into `buf`. Zero means the
    /// timeout elapsed with the line idle.
    fn read_available(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<usize, Self::Error>>;

    /// Detach the UART from the receive pin
    ///
    /// Called before raw edge timing is captured on the same pin. The next
    /// `configure` re-attaches it.
    fn release(&mut self) {}
}
