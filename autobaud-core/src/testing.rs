//! Mock collaborators for unit tests

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::string::{String, ToString};
use std::vec::Vec;

use autobaud_hal::flash::{FlashError, FlashStorage, StorageKey};
use autobaud_hal::uart::{SerialLink, UartConfig};

use crate::candidate::FrameConfig;
use crate::capture::{PulseBuffer, PulseSample};
use crate::traits::{Clock, Indicator, IndicatorState, PulseSource, SearchObserver, StatusSink};

/// Manually advanced clock
#[derive(Default)]
pub struct FakeClock {
    now: Cell<u64>,
}

impl FakeClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Pulse source replaying fixed widths
pub struct ScriptedPulses {
    widths: Vec<i32>,
    last_request: Option<(usize, u32)>,
    pub captures: usize,
}

impl ScriptedPulses {
    pub fn new(widths: &[i32]) -> Self {
        Self {
            widths: widths.to_vec(),
            last_request: None,
            captures: 0,
        }
    }

    pub fn last_request(&self) -> Option<(usize, u32)> {
        self.last_request
    }
}

impl PulseSource for ScriptedPulses {
    async fn capture(&mut self, max_samples: usize, timeout_ms: u32) -> PulseBuffer {
        self.captures += 1;
        self.last_request = Some((max_samples, timeout_ms));
        self.widths
            .iter()
            .take(max_samples)
            .map(|&w| PulseSample(w))
            .collect()
    }
}

/// Link fault raised by [`ScriptedLink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFault;

/// Serial line carrying text framed with one fixed configuration
///
/// Reads under the matching configuration return `payload`; any other
/// configuration yields `noise`, or silence when `noise` is empty. Bytes
/// pushed with [`ScriptedLink::queue`] are returned first, in order.
pub struct ScriptedLink<'a> {
    clock: &'a FakeClock,
    actual: Option<UartConfig>,
    payload: Vec<u8>,
    noise: Vec<u8>,
    current: Option<UartConfig>,
    queued: VecDeque<Result<Vec<u8>, LinkFault>>,
    pub configured: Vec<UartConfig>,
    pub fail_configure: bool,
    pub released: usize,
}

impl<'a> ScriptedLink<'a> {
    pub fn new(clock: &'a FakeClock, actual: Option<FrameConfig>, payload: &[u8]) -> Self {
        Self {
            clock,
            actual: actual.map(|c| c.uart_config()),
            payload: payload.to_vec(),
            noise: Vec::new(),
            current: None,
            queued: VecDeque::new(),
            configured: Vec::new(),
            fail_configure: false,
            released: 0,
        }
    }

    /// Line silent under every configuration
    pub fn silent(clock: &'a FakeClock) -> Self {
        Self::new(clock, None, b"")
    }

    pub fn with_noise(mut self, noise: &[u8]) -> Self {
        self.noise = noise.to_vec();
        self
    }

    pub fn queue(&mut self, chunk: Result<&[u8], LinkFault>) {
        self.queued.push_back(chunk.map(|c| c.to_vec()));
    }

    /// Frame configurations applied so far, in order
    pub fn tested(&self) -> Vec<FrameConfig> {
        self.configured
            .iter()
            .map(|c| {
                FrameConfig::new(c.baudrate, c.data_bits, c.parity, c.stop_bits).unwrap()
            })
            .collect()
    }
}

impl SerialLink for ScriptedLink<'_> {
    type Error = LinkFault;

    fn configure(&mut self, config: &UartConfig) -> Result<(), LinkFault> {
        self.configured.push(*config);
        if self.fail_configure {
            return Err(LinkFault);
        }
        self.current = Some(*config);
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, LinkFault> {
        if let Some(front) = self.queued.pop_front() {
            self.clock.advance(1);
            let mut chunk = front?;
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.queued.push_front(Ok(chunk.split_off(n)));
            }
            return Ok(n);
        }

        let source = if self.current.is_some() && self.current == self.actual {
            &self.payload
        } else {
            &self.noise
        };
        if source.is_empty() {
            self.clock.advance(timeout_ms as u64);
            return Ok(0);
        }
        self.clock.advance(1);
        let n = source.len().min(buf.len());
        buf[..n].copy_from_slice(&source[..n]);
        Ok(n)
    }

    fn release(&mut self) {
        self.released += 1;
    }
}

/// In-memory key-value store
#[derive(Default)]
pub struct MemoryFlash {
    pub slots: HashMap<u8, Vec<u8>>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl FlashStorage for MemoryFlash {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.slots.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
        if data.len() > buffer.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        self.writes += 1;
        self.slots.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

    async fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        self.slots.remove(&key.as_u8());
        Ok(())
    }
}

/// Sink keeping everything it was shown
#[derive(Default)]
pub struct RecordingSink {
    pub statuses: Vec<String>,
    pub detected: Vec<FrameConfig>,
    pub received: Vec<String>,
}

impl RecordingSink {
    pub fn saw_status(&self, needle: &str) -> bool {
        self.statuses.iter().any(|s| s.contains(needle))
    }
}

impl StatusSink for RecordingSink {
    fn show_status(&mut self, msg: &str) {
        self.statuses.push(msg.to_string());
    }

    fn show_detected_config(&mut self, config: &FrameConfig) {
        self.detected.push(*config);
    }

    fn show_received_text(&mut self, chunk: &str) {
        self.received.push(chunk.to_string());
    }
}

/// Indicator keeping every state change
#[derive(Default)]
pub struct RecordingIndicator {
    pub states: Vec<IndicatorState>,
}

impl RecordingIndicator {
    pub fn last(&self) -> Option<IndicatorState> {
        self.states.last().copied()
    }
}

impl Indicator for RecordingIndicator {
    fn set_state(&mut self, state: IndicatorState) {
        self.states.push(state);
    }
}

/// Observer keeping every attempt
#[derive(Default)]
pub struct RecordingObserver {
    pub attempts: Vec<(usize, usize, FrameConfig)>,
}

impl SearchObserver for RecordingObserver {
    fn on_attempt(&mut self, index: usize, total: usize, candidate: &FrameConfig) {
        self.attempts.push((index, total, *candidate));
    }
}
