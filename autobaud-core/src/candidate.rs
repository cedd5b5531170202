//! Candidate framing configurations
//!
//! A [`FrameConfig`] is one point of the search space. Candidate lists are
//! always produced in the same nesting order, baud rate (as supplied), then
//! data bits 8 before 7, then parity None/Even/Odd, then stop bits 1 before
//! 2. When a signal decodes cleanly under more than one framing, the first
//! in this order wins.

use core::fmt;

use heapless::Vec;

pub use autobaud_hal::uart::{DataBits, Parity, StopBits, UartConfig};

/// Standard baud rates, ascending
pub const STANDARD_BAUD_RATES: [u32; 8] = [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Data bit widths in enumeration order
pub const DATA_BITS_ORDER: [DataBits; 2] = [DataBits::Eight, DataBits::Seven];

/// Parity modes in enumeration order
pub const PARITY_ORDER: [Parity; 3] = [Parity::None, Parity::Even, Parity::Odd];

/// Stop bit counts in enumeration order
pub const STOP_BITS_ORDER: [StopBits; 2] = [StopBits::One, StopBits::Two];

/// Framings tried per baud rate
pub const FRAMINGS_PER_BAUD: usize = DATA_BITS_ORDER.len() * PARITY_ORDER.len() * STOP_BITS_ORDER.len();

/// Size of the full brute-force search space
pub const FULL_SET_SIZE: usize = STANDARD_BAUD_RATES.len() * FRAMINGS_PER_BAUD;

/// Ordered, duplicate-free list of candidates
pub type CandidateList = Vec<FrameConfig, FULL_SET_SIZE>;

/// Invalid candidate field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CandidateError {
    /// Baud rate must be positive
    ZeroBaud,
    /// Data bits other than 7 or 8
    DataBits(u8),
    /// Unknown parity code
    Parity(u8),
    /// Stop bits other than 1 or 2
    StopBits(u8),
}

/// One framing configuration under test
///
/// Fields are private so a value, once built, always holds a legal
/// combination and is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameConfig {
    baud_rate: u32,
    data_bits: DataBits,
    parity: Parity,
    stop_bits: StopBits,
}

impl FrameConfig {
    /// Create a candidate from typed fields
    pub const fn new(
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<Self, CandidateError> {
        if baud_rate == 0 {
            return Err(CandidateError::ZeroBaud);
        }
        Ok(Self {
            baud_rate,
            data_bits,
            parity,
            stop_bits,
        })
    }

    /// Create a candidate from raw integers, e.g. a persisted record
    pub fn from_raw(
        baud_rate: u32,
        data_bits: u8,
        parity_code: u8,
        stop_bits: u8,
    ) -> Result<Self, CandidateError> {
        let data = DataBits::from_bits(data_bits).ok_or(CandidateError::DataBits(data_bits))?;
        let parity = Parity::from_code(parity_code).ok_or(CandidateError::Parity(parity_code))?;
        let stop = StopBits::from_bits(stop_bits).ok_or(CandidateError::StopBits(stop_bits))?;
        Self::new(baud_rate, data, parity, stop)
    }

    pub const fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub const fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    pub const fn parity(&self) -> Parity {
        self.parity
    }

    pub const fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    /// Line configuration to hand to the link peripheral
    pub const fn uart_config(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baud_rate,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
        }
    }
}

impl fmt::Display for FrameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate,
            self.data_bits.bits(),
            self.parity.letter(),
            self.stop_bits.bits()
        )
    }
}

/// Enumerate the cross product of the given sets in the fixed order
///
/// Baud rates keep the order supplied; zero and repeated rates are skipped.
/// Data bits, parity and stop bits follow their canonical order whatever
/// order the caller lists them in. Output beyond [`FULL_SET_SIZE`] is
/// dropped.
pub fn enumerate(
    baud_rates: &[u32],
    data_bits: &[DataBits],
    parities: &[Parity],
    stop_bits: &[StopBits],
) -> CandidateList {
    let mut list = CandidateList::new();

    for (i, &baud) in baud_rates.iter().enumerate() {
        if baud == 0 || baud_rates[..i].contains(&baud) {
            continue;
        }
        for data in DATA_BITS_ORDER.iter().filter(|d| data_bits.contains(d)) {
            for parity in PARITY_ORDER.iter().filter(|p| parities.contains(p)) {
                for stop in STOP_BITS_ORDER.iter().filter(|s| stop_bits.contains(s)) {
                    let candidate = FrameConfig {
                        baud_rate: baud,
                        data_bits: *data,
                        parity: *parity,
                        stop_bits: *stop,
                    };
                    if list.push(candidate).is_err() {
                        warn!("Candidate list full, dropping the remainder");
                        return list;
                    }
                }
            }
        }
    }

    list
}

/// The 12 framings of a single baud rate
pub fn reduced_set(baud_rate: u32) -> CandidateList {
    enumerate(&[baud_rate], &DATA_BITS_ORDER, &PARITY_ORDER, &STOP_BITS_ORDER)
}

/// All 96 framings over the standard baud rates
pub fn full_set() -> CandidateList {
    enumerate(&STANDARD_BAUD_RATES, &DATA_BITS_ORDER, &PARITY_ORDER, &STOP_BITS_ORDER)
}

/// 8N1 only, at the given rates
pub fn fast_set(baud_rates: &[u32]) -> CandidateList {
    enumerate(baud_rates, &[DataBits::Eight], &[Parity::None], &[StopBits::One])
}

/// Remove every candidate that appears in `tested`, keeping order
pub fn excluding(list: &CandidateList, tested: &[FrameConfig]) -> CandidateList {
    list.iter().filter(|c| !tested.contains(c)).copied().collect()
}
