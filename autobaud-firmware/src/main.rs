//! Autobaud - Serial Line Auto-Configuration Firmware
//!
//! Main firmware binary for RP2040 boards. Listens on UART0 RX, works out
//! the baud rate and framing of whatever is sending, then forwards the
//! decoded traffic to the defmt log until the operator presses the button.

#![no_std]
#![no_main]

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::InterruptHandler as UartInterruptHandler;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use autobaud_core::capture::{EdgeDrain, EdgeQueue, EdgeRecorder};
use autobaud_core::config::{parse_config, DetectorConfig};
use autobaud_core::coordinator::FallbackCoordinator;
use autobaud_core::monitor::{MonitorExit, MonitorLoop};
use autobaud_drivers::led::LedIndicator;
use autobaud_hal_rp2040::flash::Rp2040FlashStorage;
use autobaud_hal_rp2040::gpio::{EdgeInput, LedPin};
use autobaud_hal_rp2040::uart::Rp2040Link;

use crate::capture::EdgePulses;
use crate::channels::{Press, BUTTON, CAPTURE_GATE, STOP_MONITOR};
use crate::clock::EmbassyClock;
use crate::indicator::LedQueue;
use crate::sink::LogSink;

mod capture;
mod channels;
mod clock;
mod indicator;
mod sink;
mod tasks;

/// Embedded detector settings (compiled into firmware)
/// Edit autobaud.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../autobaud.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => UartInterruptHandler<UART0>;
});

// Edge queue shared by the capture task and the coordinator (must live forever)
static EDGE_QUEUE: StaticCell<EdgeQueue> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Autobaud firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // The edge input is built before the UART so the UART keeps the pin
    // function; pad input still reaches the edge detector.
    // SAFETY: both users only read the pad, and the UART driver never
    // touches the SIO interrupt the edge input waits on.
    let edge_pin = unsafe { p.PIN_1.clone_unchecked() };
    let edge_input = EdgeInput::new(edge_pin);

    let queue = EDGE_QUEUE.init(EdgeQueue::new());
    let (producer, consumer) = queue.split();
    let recorder = EdgeRecorder::new(
        producer,
        &CAPTURE_GATE,
        config.capture.min_pulse_us,
        config.capture.max_pulse_us,
    );
    let pulses = EdgePulses::new(EdgeDrain::new(consumer, &CAPTURE_GATE));

    let link = Rp2040Link::new(p.UART0, p.PIN_1, p.DMA_CH0, Irqs);
    let storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH1);
    info!("UART0 RX on GPIO1, flash store ready");

    // Onboard LED on the Pico
    let led = LedIndicator::new(LedPin::new(p.PIN_25), Delay, false);
    let mut indicator = LedQueue;
    let mut sink = LogSink;

    let button = Input::new(p.PIN_15, Pull::Up);

    spawner.spawn(tasks::edge_capture_task(edge_input, recorder)).unwrap();
    spawner.spawn(tasks::button_task(button)).unwrap();
    spawner.spawn(tasks::led_task(led)).unwrap();
    info!("All tasks spawned");

    let monitor_config = config.monitor;
    let validator_config = config.validator;
    let mut coordinator = FallbackCoordinator::new(link, EmbassyClock, storage, pulses, config);

    loop {
        BUTTON.reset();
        STOP_MONITOR.store(false, Ordering::Release);

        match coordinator.run(&mut sink, &mut indicator).await {
            Ok(lock) => {
                info!("Locked on {}", lock.config);
                let (link, clock) = coordinator.link_and_clock();
                let mut monitor = MonitorLoop::new(link, clock, monitor_config, &validator_config);
                match monitor
                    .run(&lock.config, &STOP_MONITOR, &mut sink, &mut indicator)
                    .await
                {
                    Ok(MonitorExit::Stopped) => info!("Monitor stopped: {}", monitor.stats()),
                    Err(e) => warn!("Monitor fault: {:?}", e),
                }
            }
            Err(e) => {
                warn!("Detection cycle failed: {}", e);
                info!("Press the button to try again");
            }
        }

        if BUTTON.wait().await == Press::Long {
            info!("Forgetting saved config");
            coordinator.forget_cached().await;
        }
        coordinator.restart();
    }
}

/// Parse the embedded settings, falling back to built-in defaults
fn load_config() -> DetectorConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded embedded config");
            config
        }
        Err(e) => {
            warn!("Embedded config invalid: {:?}, using defaults", e);
            DetectorConfig::default()
        }
    }
}
