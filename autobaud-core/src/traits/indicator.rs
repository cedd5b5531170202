//! Status indicator

/// Coarse detector state shown on the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorState {
    /// Nothing running
    Idle,
    /// Testing candidates; set again on every attempt
    Searching,
    /// A framing was accepted
    Success,
    /// Forwarding live traffic
    Monitoring,
    /// Detection failed or the monitored link faulted
    Error,
}

/// Status indicator (typically an LED)
pub trait Indicator {
    fn set_state(&mut self, state: IndicatorState);
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn set_state(&mut self, state: IndicatorState) {
        (**self).set_state(state)
    }
}
