//! Status LED task
//!
//! Plays each queued indicator state on the LED, blink patterns included.

use defmt::*;
use embassy_time::Delay;

use autobaud_drivers::led::LedIndicator;
use autobaud_hal_rp2040::gpio::LedPin;

use crate::channels::LED_STATES;

#[embassy_executor::task]
pub async fn led_task(mut led: LedIndicator<LedPin<'static>, Delay>) {
    info!("LED task started");

    loop {
        let state = LED_STATES.receive().await;
        led.show(state).await;
    }
}
