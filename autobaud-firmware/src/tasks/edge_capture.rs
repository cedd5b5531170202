//! Edge capture task
//!
//! Producer half of the pulse capture. Sleeps until a capture is armed so
//! a busy line does not wake it while the link is being monitored.

use defmt::*;

use autobaud_core::capture::recorder::{EdgeRecorder, RecordOutcome};
use autobaud_hal_rp2040::gpio::EdgeInput;

use crate::channels::{CAPTURE_ARMED, CAPTURE_DONE, CAPTURE_GATE};

#[embassy_executor::task]
pub async fn edge_capture_task(mut input: EdgeInput<'static>, mut recorder: EdgeRecorder<'static>) {
    info!("Edge capture task started");

    loop {
        if !CAPTURE_GATE.is_armed() {
            CAPTURE_ARMED.wait().await;
            trace!("Capture armed, line {}", if input.is_high() { "high" } else { "low" });
        }

        let now_us = input.next_edge_us().await;
        if recorder.on_edge(now_us) == RecordOutcome::Completed {
            debug!("Capture complete");
            CAPTURE_DONE.signal(());
        }
    }
}
