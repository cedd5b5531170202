//! Fallback coordinator
//!
//! Drives detection from the cheapest path to the most exhaustive one:
//! verify the cached framing, estimate the baud rate and try its 12
//! framings, then brute-force every standard candidate. A candidate
//! tried in an earlier phase is not tried again in the same cycle. The accepted framing is
//! returned to the caller, which hands it to the monitor loop.

pub mod phase;

use core::fmt::Write;

use heapless::String;

use autobaud_hal::flash::FlashStorage;
use autobaud_hal::uart::SerialLink;

use crate::cache::ConfigCache;
use crate::candidate::{excluding, fast_set, full_set, reduced_set, CandidateList, FrameConfig};
use crate::capture::{start_capture, PulseStats};
use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::estimator::estimate;
use crate::monitor::push_sanitized;
use crate::search::{DetectionOutcome, SampleWindow, SearchEngine};
use crate::traits::{Clock, Indicator, IndicatorState, PulseSource, SearchObserver, StatusSink};

pub use phase::{Escalation, Phase, PhaseEvent};

/// Bytes of the accepted window shown in the success banner
const BANNER_SAMPLE_LEN: usize = 50;

/// A locked framing and the window that proved it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lock {
    pub config: FrameConfig,
    pub sample: SampleWindow,
}

/// Escalation driver
pub struct FallbackCoordinator<L, C, F, P> {
    engine: SearchEngine<L, C>,
    cache: ConfigCache<F>,
    pulses: P,
    config: DetectorConfig,
    escalation: Escalation,
    phase: Phase,
    last_error: Option<DetectError>,
}

impl<L, C, F, P> FallbackCoordinator<L, C, F, P>
where
    L: SerialLink,
    C: Clock,
    F: FlashStorage,
    P: PulseSource,
{
    pub fn new(link: L, clock: C, storage: F, pulses: P, config: DetectorConfig) -> Self {
        let escalation = Escalation {
            use_baud_detection: config.search.use_baud_detection,
            fallback_to_full: config.search.fallback_to_full,
        };
        Self {
            engine: SearchEngine::new(link, clock, &config),
            cache: ConfigCache::new(storage),
            pulses,
            config,
            escalation,
            phase: Phase::LoadCache,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Most recent non-terminal error, for diagnostics
    pub fn last_error(&self) -> Option<DetectError> {
        self.last_error
    }

    /// Validator verdict on the last candidate that was not accepted
    pub fn last_verdict(&self) -> Option<DetectError> {
        self.engine.last_verdict()
    }

    /// Run phases until a framing is locked or every phase failed
    ///
    /// On failure the indicator and sink are told and
    /// `AllPhasesExhausted` is returned; the coordinator then stays in
    /// [`Phase::Failed`] until [`restart`](Self::restart).
    pub async fn run<S: StatusSink, I: Indicator>(
        &mut self,
        sink: &mut S,
        indicator: &mut I,
    ) -> Result<Lock, DetectError> {
        let mut accepted: Option<Lock> = None;

        loop {
            let event = match self.phase {
                Phase::LoadCache => {
                    indicator.set_state(IndicatorState::Searching);
                    sink.show_status("Checking saved config");
                    match self.cache.load().await {
                        Some(config) => PhaseEvent::CacheHit(config),
                        None => PhaseEvent::CacheMiss,
                    }
                }
                Phase::VerifyCache(config) => {
                    sink.show_status("Verifying saved config");
                    let outcome = self.search_pass(&[config], sink, indicator).await;
                    self.finish_pass(outcome, false, &mut accepted).await
                }
                Phase::DetectBaud => self.detect_baud(sink).await,
                Phase::ReducedSearch(baud) => {
                    let mut msg: String<32> = String::new();
                    let _ = write!(msg, "Testing {} baud", baud);
                    sink.show_status(&msg);
                    let candidates = excluding(&reduced_set(baud), self.engine.tested());
                    let outcome = self.search_pass(&candidates, sink, indicator).await;
                    self.finish_pass(outcome, true, &mut accepted).await
                }
                Phase::FullSearch => {
                    sink.show_status("Testing all baud rates...");
                    let candidates = excluding(&self.full_candidates(), self.engine.tested());
                    info!("Full search over {} candidates", candidates.len());
                    let outcome = self.search_pass(&candidates, sink, indicator).await;
                    self.finish_pass(outcome, true, &mut accepted).await
                }
                Phase::Monitoring(config) => {
                    let sample = accepted.take().map(|l| l.sample).unwrap_or_default();
                    return Ok(Lock { config, sample });
                }
                Phase::Failed => {
                    error!("No working configuration found");
                    indicator.set_state(IndicatorState::Error);
                    sink.show_status("NO CONFIG FOUND");
                    sink.show_status("Check connections");
                    sink.show_status("and try again");
                    return Err(DetectError::AllPhasesExhausted);
                }
            };

            let next = self.phase.transition(event, &self.escalation);
            debug!("Phase {} -> {}", self.phase, next);

            if let Some(lock) = accepted.as_ref().filter(|_| matches!(next, Phase::Monitoring(_))) {
                announce(lock, sink, indicator);
            }
            self.phase = next;
        }
    }

    /// Start over from the cache; candidates tried in the previous cycle are forgotten
    pub fn restart(&mut self) {
        self.phase = self.phase.transition(PhaseEvent::Restart, &self.escalation);
        if self.phase == Phase::LoadCache {
            self.engine.clear_history();
            self.last_error = None;
        }
    }

    /// Erase the cached framing so the next cycle cannot use it
    pub async fn forget_cached(&mut self) {
        if let Err(e) = self.cache.clear().await {
            warn!("Failed to clear cached config: {:?}", e);
        }
    }

    /// Borrow the link and clock, e.g. for the monitor loop
    pub fn link_and_clock(&mut self) -> (&mut L, &C) {
        self.engine.parts_mut()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn full_candidates(&self) -> CandidateList {
        if self.config.search.fast_mode {
            fast_set(&self.config.search.fast_bauds)
        } else {
            full_set()
        }
    }

    async fn detect_baud<S: StatusSink>(&mut self, sink: &mut S) -> PhaseEvent {
        sink.show_status("Measuring pulse widths...");
        self.engine.link_mut().release();

        let report = start_capture(&mut self.pulses, &self.config.capture).await;
        if let Some(stats) = PulseStats::from_samples(&report.samples) {
            debug!("Pulse stats: {}", stats);
        }

        let result = report
            .into_samples()
            .and_then(|samples| estimate(&samples, &self.config.estimator));

        match result {
            Ok(baud) => PhaseEvent::BaudEstimated(baud),
            Err(e) => {
                warn!("Baud detection failed: {}", e);
                self.last_error = Some(e);
                sink.show_status("Detection failed");
                sink.show_status("Falling back to full search");
                PhaseEvent::EstimationFailed
            }
        }
    }

    async fn search_pass<S: StatusSink, I: Indicator>(
        &mut self,
        candidates: &[FrameConfig],
        sink: &mut S,
        indicator: &mut I,
    ) -> DetectionOutcome {
        let timeout = self.config.search.per_candidate_timeout_ms;
        let mut progress = Progress { sink, indicator };
        self.engine.search(candidates, timeout, &mut progress).await
    }

    /// Turn a pass outcome into an event, persisting new locks when asked
    async fn finish_pass(
        &mut self,
        outcome: DetectionOutcome,
        persist: bool,
        accepted: &mut Option<Lock>,
    ) -> PhaseEvent {
        match outcome {
            DetectionOutcome::Accepted(config, sample) => {
                if persist {
                    if let Err(e) = self.cache.save(&config).await {
                        // Still usable for this session
                        warn!("Failed to save link config: {:?}", e);
                    }
                }
                *accepted = Some(Lock { config, sample });
                PhaseEvent::Accepted(config)
            }
            DetectionOutcome::Rejected | DetectionOutcome::Inconclusive => {
                let e = DetectError::SearchExhausted { phase: self.phase };
                info!(
                    "{}: {}/{} rejected, last verdict {}",
                    e,
                    self.engine.rejected().len(),
                    self.engine.tested().len(),
                    self.engine.last_verdict()
                );
                self.last_error = Some(e);
                PhaseEvent::SearchFailed
            }
        }
    }
}

/// Success banner
fn announce<S: StatusSink, I: Indicator>(lock: &Lock, sink: &mut S, indicator: &mut I) {
    indicator.set_state(IndicatorState::Success);
    sink.show_status("SUCCESS!");
    sink.show_detected_config(&lock.config);
    sink.show_status("Sample data:");

    let mut sample: String<BANNER_SAMPLE_LEN> = String::new();
    let len = lock.sample.len().min(BANNER_SAMPLE_LEN);
    push_sanitized(&lock.sample[..len], &mut sample);
    sink.show_status(&sample);
}

/// Reports each attempt as "Config i/n" and blinks the indicator
struct Progress<'a, S, I> {
    sink: &'a mut S,
    indicator: &'a mut I,
}

impl<S: StatusSink, I: Indicator> SearchObserver for Progress<'_, S, I> {
    fn on_attempt(&mut self, index: usize, total: usize, candidate: &FrameConfig) {
        self.indicator.set_state(IndicatorState::Searching);

        let mut msg: String<32> = String::new();
        let _ = write!(msg, "Config {}/{}", index, total);
        self.sink.show_status(&msg);

        msg.clear();
        let _ = write!(msg, "{}", candidate);
        self.sink.show_status(&msg);

        trace!("Attempt {}/{}: {}", index, total, candidate);
    }
}
