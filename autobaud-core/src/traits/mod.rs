//! Collaborator traits
//!
//! These traits define the interface between the detection logic and the
//! board: timing, edge capture, status output and display rendering. The
//! serial link and flash store traits live in `autobaud-hal`.

pub mod clock;
pub mod display;
pub mod indicator;
pub mod pulse;
pub mod sink;

pub use clock::Clock;
pub use display::DisplayBackend;
pub use indicator::{Indicator, IndicatorState};
pub use pulse::PulseSource;
pub use sink::{SearchObserver, StatusSink};
