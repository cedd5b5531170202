//! Operator button task
//!
//! A short press stops monitoring and restarts detection. Holding the
//! button also forgets the saved configuration.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Timer};

use crate::channels::{Press, BUTTON, STOP_MONITOR};

/// Contact bounce settle time
const DEBOUNCE_MS: u64 = 20;

/// Hold time that turns a press into a long press
const LONG_PRESS_MS: u64 = 2000;

/// Button task - active low with the internal pull-up
#[embassy_executor::task]
pub async fn button_task(mut button: Input<'static>) {
    info!("Button task started");

    loop {
        button.wait_for_falling_edge().await;
        Timer::after_millis(DEBOUNCE_MS).await;
        if button.is_high() {
            continue;
        }

        let hold = Duration::from_millis(LONG_PRESS_MS);
        let press = match with_timeout(hold, button.wait_for_rising_edge()).await {
            Ok(()) => Press::Short,
            Err(_) => Press::Long,
        };
        info!("Button: {}", press);

        STOP_MONITOR.store(true, Ordering::Release);
        BUTTON.signal(press);

        if press == Press::Long {
            button.wait_for_high().await;
        }
        Timer::after_millis(DEBOUNCE_MS).await;
    }
}
