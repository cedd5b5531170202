//! Candidate search over a live link
//!
//! Each candidate is applied to the link, a sample window is collected
//! under a deadline, and the window is validated. Reconfiguration and
//! sampling are strictly sequential, and the search stops at the first
//! accepted candidate.

use heapless::Vec;

use autobaud_hal::uart::SerialLink;

use crate::candidate::{CandidateList, FrameConfig};
use crate::config::{DetectorConfig, ValidatorConfig, MAX_WINDOW_LEN};
use crate::error::DetectError;
use crate::traits::{Clock, SearchObserver};
use crate::validator::{validate, Validation};

/// Bytes captured while testing one candidate, in arrival order
pub type SampleWindow = Vec<u8, MAX_WINDOW_LEN>;

/// Result of testing one candidate or a whole pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectionOutcome {
    /// Window validated as text under this candidate
    Accepted(FrameConfig, SampleWindow),
    /// Window long enough and not text, or every candidate of a pass failed
    Rejected,
    /// Too little data, or the link faulted, to judge the candidate
    Inconclusive,
}

impl DetectionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DetectionOutcome::Accepted(..))
    }
}

/// Sequential candidate tester
///
/// Owns the link for the duration of detection. Every candidate applied
/// to the link is remembered so later phases can skip it, whatever its
/// outcome was.
pub struct SearchEngine<L, C> {
    link: L,
    clock: C,
    validator: ValidatorConfig,
    target_len: usize,
    tested: CandidateList,
    rejected: CandidateList,
    last_verdict: Option<DetectError>,
}

impl<L: SerialLink, C: Clock> SearchEngine<L, C> {
    pub fn new(link: L, clock: C, config: &DetectorConfig) -> Self {
        Self {
            link,
            clock,
            validator: config.validator,
            target_len: config.search.target_len.min(MAX_WINDOW_LEN),
            tested: CandidateList::new(),
            rejected: CandidateList::new(),
            last_verdict: None,
        }
    }

    /// Apply one candidate and judge what arrives within `timeout_ms`
    pub async fn test_candidate(&mut self, candidate: &FrameConfig, timeout_ms: u32) -> DetectionOutcome {
        remember(&mut self.tested, candidate);

        if self.link.configure(&candidate.uart_config()).is_err() {
            warn!("Link refused {}", candidate);
            return DetectionOutcome::Inconclusive;
        }

        let window = match self.collect_window(timeout_ms).await {
            Some(window) => window,
            None => {
                warn!("Link read failed under {}", candidate);
                return DetectionOutcome::Inconclusive;
            }
        };

        let verdict = validate(&window, &self.validator);
        if let Err(e) = verdict.into_result(&self.validator) {
            self.last_verdict = Some(e);
        }

        match verdict {
            Validation::Accepted { ratio_permille } => {
                info!("Accepted {} ({} permille printable)", candidate, ratio_permille);
                DetectionOutcome::Accepted(*candidate, window)
            }
            Validation::Rejected { ratio_permille } => {
                trace!("Rejected {} ({} permille printable)", candidate, ratio_permille);
                remember(&mut self.rejected, candidate);
                DetectionOutcome::Rejected
            }
            Validation::TooShort { len } => {
                trace!("Only {} bytes under {}", len, candidate);
                DetectionOutcome::Inconclusive
            }
        }
    }

    /// Test candidates in order until one is accepted
    ///
    /// Returns `Rejected` when the list is exhausted, even if some
    /// candidates were only inconclusive.
    pub async fn search<O: SearchObserver>(
        &mut self,
        candidates: &[FrameConfig],
        timeout_ms: u32,
        observer: &mut O,
    ) -> DetectionOutcome {
        let total = candidates.len();
        for (i, candidate) in candidates.iter().enumerate() {
            if candidates[..i].contains(candidate) {
                continue;
            }
            observer.on_attempt(i + 1, total, candidate);
            let outcome = self.test_candidate(candidate, timeout_ms).await;
            if outcome.is_accepted() {
                return outcome;
            }
        }
        DetectionOutcome::Rejected
    }

    /// Read until the window holds `target_len` bytes or the deadline passes
    ///
    /// `None` if the link reported an error.
    async fn collect_window(&mut self, timeout_ms: u32) -> Option<SampleWindow> {
        let mut window = SampleWindow::new();
        let mut buf = [0u8; MAX_WINDOW_LEN];
        let deadline = self.clock.now_ms() + timeout_ms as u64;

        while window.len() < self.target_len {
            let now = self.clock.now_ms();
            if now >= deadline {
                break;
            }
            let room = self.target_len - window.len();
            let remaining = (deadline - now).min(u32::MAX as u64) as u32;
            let n = self.link.read_available(&mut buf[..room], remaining).await.ok()?;
            let _ = window.extend_from_slice(&buf[..n.min(room)]);
        }

        Some(window)
    }

    /// Candidates applied to the link so far, in order
    pub fn tested(&self) -> &[FrameConfig] {
        &self.tested
    }

    /// Candidates whose window was judged not to be text
    pub fn rejected(&self) -> &[FrameConfig] {
        &self.rejected
    }

    /// Validator verdict of the most recent candidate that was not accepted
    pub fn last_verdict(&self) -> Option<DetectError> {
        self.last_verdict
    }

    /// Forget tested candidates and verdicts, e.g. before a fresh cycle
    pub fn clear_history(&mut self) {
        self.tested.clear();
        self.rejected.clear();
        self.last_verdict = None;
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Borrow the link mutably and the clock shared at the same time
    pub fn parts_mut(&mut self) -> (&mut L, &C) {
        (&mut self.link, &self.clock)
    }

    /// Hand the link and clock back, e.g. to the monitor loop
    pub fn into_parts(self) -> (L, C) {
        (self.link, self.clock)
    }
}

fn remember(list: &mut CandidateList, candidate: &FrameConfig) {
    if !list.contains(candidate) && list.push(*candidate).is_err() {
        warn!("Candidate history full, {} not recorded", candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{full_set, reduced_set, DataBits, Parity, StopBits};
    use crate::testing::{FakeClock, RecordingObserver, ScriptedLink};
    use embassy_futures::block_on;

    const TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog\r\n";
    const NOISE: &[u8] = &[0x00, 0xFF, 0x81, 0x13, 0x9A, 0xE0, 0x01, 0x7F, 0x00, 0xC3, 0x8E, 0x02];

    fn frame(baud: u32, data: DataBits, parity: Parity, stop: StopBits) -> FrameConfig {
        FrameConfig::new(baud, data, parity, stop).unwrap()
    }

    #[test]
    fn test_accepts_matching_candidate() {
        let clock = FakeClock::default();
        let actual = frame(9600, DataBits::Eight, Parity::None, StopBits::One);
        let link = ScriptedLink::new(&clock, Some(actual), TEXT);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());

        let outcome = block_on(engine.test_candidate(&actual, 1000));
        match outcome {
            DetectionOutcome::Accepted(c, window) => {
                assert_eq!(c, actual);
                assert_eq!(window.len(), 64);
                assert!(window.starts_with(b"The quick"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_noise_is_rejected_and_remembered() {
        let clock = FakeClock::default();
        let link = ScriptedLink::silent(&clock).with_noise(NOISE);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let candidate = frame(19200, DataBits::Seven, Parity::Even, StopBits::One);

        assert_eq!(block_on(engine.test_candidate(&candidate, 1000)), DetectionOutcome::Rejected);
        assert_eq!(engine.rejected(), &[candidate]);
        assert_eq!(engine.tested(), &[candidate]);
        assert!(matches!(
            engine.last_verdict(),
            Some(DetectError::ConfigurationRejected { .. })
        ));
    }

    #[test]
    fn test_silence_is_inconclusive_and_bounded() {
        let clock = FakeClock::default();
        let link = ScriptedLink::silent(&clock);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let candidate = frame(9600, DataBits::Eight, Parity::None, StopBits::One);

        assert_eq!(
            block_on(engine.test_candidate(&candidate, 1000)),
            DetectionOutcome::Inconclusive
        );
        assert!(engine.rejected().is_empty());
        assert_eq!(engine.tested(), &[candidate]);
        assert_eq!(
            engine.last_verdict(),
            Some(DetectError::ValidationTooShort { len: 0, required: 10 })
        );
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_configure_failure_is_inconclusive() {
        let clock = FakeClock::default();
        let mut link = ScriptedLink::silent(&clock);
        link.fail_configure = true;
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let candidate = frame(9600, DataBits::Eight, Parity::None, StopBits::One);

        assert_eq!(
            block_on(engine.test_candidate(&candidate, 1000)),
            DetectionOutcome::Inconclusive
        );
    }

    #[test]
    fn test_read_fault_is_inconclusive() {
        let clock = FakeClock::default();
        let mut link = ScriptedLink::silent(&clock);
        link.queue(Err(crate::testing::LinkFault));
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let candidate = frame(9600, DataBits::Eight, Parity::None, StopBits::One);

        assert_eq!(
            block_on(engine.test_candidate(&candidate, 1000)),
            DetectionOutcome::Inconclusive
        );
        assert!(engine.rejected().is_empty());
    }

    #[test]
    fn test_search_stops_at_first_acceptance() {
        let clock = FakeClock::default();
        let actual = frame(9600, DataBits::Eight, Parity::Even, StopBits::One);
        let link = ScriptedLink::new(&clock, Some(actual), TEXT).with_noise(NOISE);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let mut observer = RecordingObserver::default();

        let candidates = reduced_set(9600);
        let outcome = block_on(engine.search(&candidates, 1000, &mut observer));

        assert!(matches!(outcome, DetectionOutcome::Accepted(c, _) if c == actual));
        // 8N1, 8N2, 8E1: nothing after the accepted candidate
        let (link, _) = engine.into_parts();
        assert_eq!(link.tested(), &candidates[..3]);
        assert_eq!(observer.attempts.len(), 3);
        assert_eq!(observer.attempts[2], (3, 12, actual));
    }

    #[test]
    fn test_search_exhaustion_is_rejected() {
        let clock = FakeClock::default();
        let link = ScriptedLink::silent(&clock).with_noise(NOISE);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());

        let candidates = full_set();
        let outcome = block_on(engine.search(&candidates, 1000, &mut ()));

        assert_eq!(outcome, DetectionOutcome::Rejected);
        assert_eq!(engine.rejected().len(), 96);
    }

    #[test]
    fn test_search_skips_repeated_candidate() {
        let clock = FakeClock::default();
        let link = ScriptedLink::silent(&clock).with_noise(NOISE);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());
        let c = frame(9600, DataBits::Eight, Parity::None, StopBits::One);

        block_on(engine.search(&[c, c], 1000, &mut ()));

        assert_eq!(engine.tested(), &[c]);
        let (link, _) = engine.into_parts();
        assert_eq!(link.configured.len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let clock = FakeClock::default();
        let link = ScriptedLink::silent(&clock).with_noise(NOISE);
        let mut engine = SearchEngine::new(link, &clock, &DetectorConfig::default());

        block_on(engine.search(&reduced_set(38400), 1000, &mut ()));
        assert_eq!(engine.tested().len(), 12);

        engine.clear_history();
        assert!(engine.tested().is_empty());
        assert!(engine.rejected().is_empty());
        assert_eq!(engine.last_verdict(), None);
    }
}
