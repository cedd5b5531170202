//! Inter-task communication
//!
//! Statics shared between the main task, the edge capture task and the
//! button task.

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use autobaud_core::capture::recorder::CaptureGate;
use autobaud_core::traits::IndicatorState;

/// Queued LED states; a full queue drops new states
const LED_CHANNEL_SIZE: usize = 8;

/// Operator button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Press {
    /// Stop monitoring and run detection again
    Short,
    /// As `Short`, and forget the saved configuration first
    Long,
}

/// Arming state and sample budget of the current pulse capture
pub static CAPTURE_GATE: CaptureGate = CaptureGate::new();

/// Raised by the capture consumer after arming the gate
pub static CAPTURE_ARMED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Raised by the edge task when the sample limit is reached
pub static CAPTURE_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Polled by the monitor loop between reads
pub static STOP_MONITOR: AtomicBool = AtomicBool::new(false);

/// Last button press, consumed by the main task
pub static BUTTON: Signal<CriticalSectionRawMutex, Press> = Signal::new();

/// Indicator states for the LED task
pub static LED_STATES: Channel<CriticalSectionRawMutex, IndicatorState, LED_CHANNEL_SIZE> =
    Channel::new();
