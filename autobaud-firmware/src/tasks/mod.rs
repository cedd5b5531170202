//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod edge_capture;
pub mod led;

pub use button::button_task;
pub use edge_capture::edge_capture_task;
pub use led::led_task;
