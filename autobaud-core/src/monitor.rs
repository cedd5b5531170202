//! Live monitoring of a locked link
//!
//! The monitor reapplies the accepted framing, then forwards received
//! bytes to the sink one line at a time. A line ends at `\n` or when the
//! chunk buffer fills; `\r` is dropped. Lines that do not look like text
//! are forwarded as hex when enabled.
//!
//! All buffers are fixed-size. The periodic reclamation pass flushes a
//! partial line that has been sitting in the buffer, so a sender that never
//! terminates its lines still gets displayed.

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use heapless::{String, Vec};

use autobaud_hal::uart::SerialLink;

use crate::candidate::FrameConfig;
use crate::config::{MonitorConfig, ValidatorConfig};
use crate::traits::{Clock, Indicator, IndicatorState, StatusSink};
use crate::validator::{is_printable, printable_count};

/// Longest line forwarded as one chunk
pub const MAX_CHUNK_LEN: usize = 64;

/// Rendered line: prefix plus two hex digits per byte
pub type ChunkText = String<{ 2 * MAX_CHUNK_LEN + 8 }>;

/// Why the monitor returned normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorExit {
    /// The stop flag was raised
    Stopped,
}

/// Unrecoverable monitor fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError<E> {
    /// Link refused the configuration or failed a read
    Link(E),
}

/// Counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorStats {
    pub bytes: u32,
    pub text_chunks: u32,
    pub hex_chunks: u32,
    pub dropped_chunks: u32,
    pub reclaim_passes: u32,
}

/// Forwarding loop over a borrowed link
pub struct MonitorLoop<'a, L, C> {
    link: &'a mut L,
    clock: &'a C,
    config: MonitorConfig,
    threshold_permille: u16,
    pending: Vec<u8, MAX_CHUNK_LEN>,
    /// When the oldest byte in `pending` arrived
    pending_since_ms: u64,
    last_reclaim_ms: u64,
    stats: MonitorStats,
}

impl<'a, L: SerialLink, C: Clock> MonitorLoop<'a, L, C> {
    pub fn new(link: &'a mut L, clock: &'a C, config: MonitorConfig, validator: &ValidatorConfig) -> Self {
        let now = clock.now_ms();
        Self {
            link,
            clock,
            config,
            threshold_permille: validator.threshold_permille,
            pending: Vec::new(),
            pending_since_ms: now,
            last_reclaim_ms: now,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Reapply `frame` and forward traffic until `stop` is raised or the link faults
    ///
    /// Faults are shown on the sink and indicator before being returned.
    pub async fn run<S: StatusSink, I: Indicator>(
        &mut self,
        frame: &FrameConfig,
        stop: &AtomicBool,
        sink: &mut S,
        indicator: &mut I,
    ) -> Result<MonitorExit, MonitorError<L::Error>> {
        if let Err(e) = self.link.configure(&frame.uart_config()) {
            error!("Link refused {} for monitoring", frame);
            return Err(self.fault(MonitorError::Link(e), sink, indicator));
        }

        info!("Monitoring {}", frame);
        indicator.set_state(IndicatorState::Monitoring);
        sink.show_status("MONITORING SERIAL");
        sink.show_detected_config(frame);
        sink.show_status("====================");

        self.last_reclaim_ms = self.clock.now_ms();

        loop {
            if stop.load(Ordering::Acquire) {
                self.flush_pending(sink);
                info!("Monitoring stopped: {}", self.stats);
                sink.show_status("MONITORING STOPPED");
                indicator.set_state(IndicatorState::Idle);
                return Ok(MonitorExit::Stopped);
            }

            if let Err(e) = self.poll_once(sink).await {
                return Err(self.fault(e, sink, indicator));
            }
        }
    }

    /// One read plus any due reclamation pass
    pub async fn poll_once<S: StatusSink>(&mut self, sink: &mut S) -> Result<(), MonitorError<L::Error>> {
        let mut buf = [0u8; MAX_CHUNK_LEN];
        let n = self
            .link
            .read_available(&mut buf, self.config.poll_timeout_ms)
            .await
            .map_err(MonitorError::Link)?;
        let now = self.clock.now_ms();

        self.stats.bytes = self.stats.bytes.wrapping_add(n as u32);
        for &byte in &buf[..n] {
            match byte {
                b'\n' => self.flush_pending(sink),
                b'\r' => {}
                _ => {
                    if self.pending.is_full() {
                        self.flush_pending(sink);
                    }
                    if self.pending.is_empty() {
                        self.pending_since_ms = now;
                    }
                    let _ = self.pending.push(byte);
                }
            }
        }
        if self.pending.is_full() {
            self.flush_pending(sink);
        }

        if now.saturating_sub(self.last_reclaim_ms) >= self.config.reclaim_interval_ms as u64 {
            self.reclaim(now, sink);
            self.last_reclaim_ms = now;
        }

        Ok(())
    }

    /// Flush a partial line once it has waited a full interval, and count the pass
    fn reclaim<S: StatusSink>(&mut self, now: u64, sink: &mut S) {
        let age = now.saturating_sub(self.pending_since_ms);
        if !self.pending.is_empty() && age >= self.config.reclaim_interval_ms as u64 {
            self.flush_pending(sink);
        }
        self.stats.reclaim_passes = self.stats.reclaim_passes.wrapping_add(1);
        trace!("Reclaim pass {}", self.stats.reclaim_passes);
    }

    fn flush_pending<S: StatusSink>(&mut self, sink: &mut S) {
        if self.pending.iter().all(|b| b.is_ascii_whitespace()) {
            self.pending.clear();
            return;
        }

        let chunk = &self.pending;
        let printable = printable_count(chunk);
        let mut line = ChunkText::new();

        if printable * 1000 >= self.threshold_permille as usize * chunk.len() {
            let _ = line.push_str("RX: ");
            push_sanitized(chunk, &mut line);
            self.stats.text_chunks = self.stats.text_chunks.wrapping_add(1);
            sink.show_received_text(&line);
        } else if self.config.show_hex {
            let _ = line.push_str("HEX: ");
            push_hex(chunk, &mut line);
            self.stats.hex_chunks = self.stats.hex_chunks.wrapping_add(1);
            sink.show_received_text(&line);
        } else {
            self.stats.dropped_chunks = self.stats.dropped_chunks.wrapping_add(1);
        }

        self.pending.clear();
    }

    fn fault<S: StatusSink, I: Indicator>(
        &mut self,
        err: MonitorError<L::Error>,
        sink: &mut S,
        indicator: &mut I,
    ) -> MonitorError<L::Error> {
        self.flush_pending(sink);
        warn!("Monitor stopped on link fault");
        sink.show_status("ERROR: link fault");
        indicator.set_state(IndicatorState::Error);
        err
    }
}

/// Append bytes as text, replacing anything unprintable with `.`
///
/// Stops silently when `out` is full.
pub fn push_sanitized<const N: usize>(bytes: &[u8], out: &mut String<N>) {
    for &b in bytes {
        let c = match b {
            b'\t' => ' ',
            b'\r' | b'\n' => continue,
            b if is_printable(b) => b as char,
            _ => '.',
        };
        if out.push(c).is_err() {
            break;
        }
    }
}

/// Append bytes as lowercase hex pairs
///
/// Stops silently when `out` is full.
pub fn push_hex<const N: usize>(bytes: &[u8], out: &mut String<N>) {
    for &b in bytes {
        if out.len() + 2 > out.capacity() {
            break;
        }
        let _ = write!(out, "{:02x}", b);
    }
}
