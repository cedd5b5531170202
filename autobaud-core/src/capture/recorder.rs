//! Lock-free edge recorder
//!
//! The producer half runs at interrupt level (or in a high-priority task
//! woken by the pin) and does nothing but turn edge timestamps into
//! [`PulseSample`]s and push them into a bounded SPSC queue. The consumer
//! half arms a capture, waits, then drains the queue once the gate says
//! the capture is over.
//!
//! Handoff rules:
//! - Only the consumer arms. Arming first discards anything left over from
//!   an earlier capture.
//! - The producer disarms when the sample limit is reached.
//! - The consumer disarms on timeout, then drains.
//! - The producer never writes while the gate is closed.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use super::{PulseBuffer, PulseSample};
use crate::config::MAX_PULSE_SAMPLES;

/// Queue slots; a heapless SPSC queue holds one less than its length
pub const EDGE_QUEUE_LEN: usize = MAX_PULSE_SAMPLES + 1;

/// Backing storage shared by the recorder and the drain
pub type EdgeQueue = Queue<PulseSample, EDGE_QUEUE_LEN>;

/// Capture-complete flag and per-capture sample budget
pub struct CaptureGate {
    armed: AtomicBool,
    remaining: AtomicUsize,
    epoch: AtomicU32,
}

impl CaptureGate {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            remaining: AtomicUsize::new(0),
            epoch: AtomicU32::new(0),
        }
    }

    /// Whether a capture is in progress
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    fn arm(&self, max_samples: usize) {
        self.remaining.store(max_samples, Ordering::Relaxed);
        // Single writer, so thumbv6m needs no read-modify-write
        let epoch = self.epoch.load(Ordering::Relaxed).wrapping_add(1);
        self.epoch.store(epoch, Ordering::Relaxed);
        self.armed.store(max_samples > 0, Ordering::Release);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new()
    }
}

/// What the recorder did with one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordOutcome {
    /// Gate closed, first edge of a capture, or pulse out of range
    Ignored,
    /// A sample was queued
    Recorded,
    /// A sample was queued and the limit is reached; the gate is now closed
    Completed,
}

/// Producer half
pub struct EdgeRecorder<'a> {
    producer: Producer<'a, PulseSample, EDGE_QUEUE_LEN>,
    gate: &'a CaptureGate,
    min_pulse_us: u32,
    max_pulse_us: u32,
    last_edge_us: Option<u32>,
    epoch: u32,
}

impl<'a> EdgeRecorder<'a> {
    /// Create a recorder keeping pulses within `[min_pulse_us, max_pulse_us]`
    pub fn new(
        producer: Producer<'a, PulseSample, EDGE_QUEUE_LEN>,
        gate: &'a CaptureGate,
        min_pulse_us: u32,
        max_pulse_us: u32,
    ) -> Self {
        Self {
            producer,
            gate,
            min_pulse_us,
            max_pulse_us,
            last_edge_us: None,
            epoch: 0,
        }
    }

    /// Record an edge seen at `now_us` (free-running, wrapping µs counter)
    pub fn on_edge(&mut self, now_us: u32) -> RecordOutcome {
        if !self.gate.is_armed() {
            self.last_edge_us = None;
            return RecordOutcome::Ignored;
        }

        let epoch = self.gate.epoch.load(Ordering::Relaxed);
        if epoch != self.epoch {
            self.epoch = epoch;
            self.last_edge_us = None;
        }

        let Some(last) = self.last_edge_us.replace(now_us) else {
            return RecordOutcome::Ignored;
        };

        let width = now_us.wrapping_sub(last);
        if width < self.min_pulse_us || width > self.max_pulse_us {
            return RecordOutcome::Ignored;
        }
        let Ok(width) = i32::try_from(width) else {
            return RecordOutcome::Ignored;
        };

        if self.producer.enqueue(PulseSample(width)).is_err() {
            // Queue full means the consumer's budget is already spent
            self.gate.disarm();
            return RecordOutcome::Completed;
        }

        let remaining = self.gate.remaining.load(Ordering::Relaxed).saturating_sub(1);
        self.gate.remaining.store(remaining, Ordering::Relaxed);
        if remaining == 0 {
            self.gate.disarm();
            RecordOutcome::Completed
        } else {
            RecordOutcome::Recorded
        }
    }
}

/// Consumer half
pub struct EdgeDrain<'a> {
    consumer: Consumer<'a, PulseSample, EDGE_QUEUE_LEN>,
    gate: &'a CaptureGate,
}

impl<'a> EdgeDrain<'a> {
    pub fn new(consumer: Consumer<'a, PulseSample, EDGE_QUEUE_LEN>, gate: &'a CaptureGate) -> Self {
        Self { consumer, gate }
    }

    /// Start a capture of at most `max_samples` pulses
    pub fn arm(&mut self, max_samples: usize) {
        self.gate.disarm();
        while self.consumer.dequeue().is_some() {}
        self.gate.arm(max_samples.min(MAX_PULSE_SAMPLES));
    }

    /// Whether the producer closed the gate after reaching the limit
    pub fn is_complete(&self) -> bool {
        !self.gate.is_armed()
    }

    /// Close the gate and collect the samples in arrival order
    pub fn finish(&mut self) -> PulseBuffer {
        self.gate.disarm();
        let mut samples = PulseBuffer::new();
        while let Some(sample) = self.consumer.dequeue() {
            if samples.push(sample).is_err() {
                break;
            }
        }
        samples
    }
}
