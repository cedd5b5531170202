//! Reconfigurable UART receive link
//!
//! The RP2040 UART cannot change word length or parity on a running
//! driver, so every `configure` tears the receiver down and builds a new
//! one from the same peripherals. Bytes are pulled one DMA transfer at a
//! time; the 32-byte hardware FIFO covers the gap between transfers.

use autobaud_hal::uart::{DataBits, Parity, StopBits, UartConfig};
use autobaud_hal::SerialLink;
use embassy_rp::dma::Channel;
use embassy_rp::interrupt::typelevel::Binding;
use embassy_rp::uart::{self, Async, Instance, InterruptHandler, RxPin, UartRx};
use embassy_rp::Peri;
use embassy_time::{with_timeout, Duration, Instant};

/// Byte substituted for a character that failed framing or parity checks
///
/// Never printable, so a wrong candidate is still judged on what it
/// received instead of aborting the window.
pub const LINE_ERROR_BYTE: u8 = 0xFF;

/// Idle time, in character times, that ends a read early
const IDLE_CHARS: u64 = 4;

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Read attempted before any `configure`
    NotConfigured,
    /// Baud rate outside what the peripheral clock can divide to
    UnsupportedBaud(u32),
}

/// RP2040 receive link on one UART instance
pub struct Rp2040Link<'d, T: Instance, P: RxPin<T>, D: Channel, I> {
    uart: Peri<'d, T>,
    rx_pin: Peri<'d, P>,
    dma: Peri<'d, D>,
    irqs: I,
    rx: Option<UartRx<'d, Async>>,
    active: Option<UartConfig>,
}

impl<'d, T, P, D, I> Rp2040Link<'d, T, P, D, I>
where
    T: Instance,
    P: RxPin<T>,
    D: Channel,
    I: Binding<T::Interrupt, InterruptHandler<T>> + Copy,
{
    /// Create an idle link; nothing is received until `configure`
    pub fn new(uart: Peri<'d, T>, rx_pin: Peri<'d, P>, dma: Peri<'d, D>, irqs: I) -> Self {
        Self {
            uart,
            rx_pin,
            dma,
            irqs,
            rx: None,
            active: None,
        }
    }

    /// Configuration of the running receiver, if any
    pub fn active(&self) -> Option<&UartConfig> {
        self.active.as_ref()
    }

    fn idle_gap(baudrate: u32) -> Duration {
        // 11 bits covers the longest frame: start, 8 data, parity, 2 stop
        let char_us = 11_000_000u64 / baudrate.max(1) as u64;
        Duration::from_micros((char_us * IDLE_CHARS).max(1_000))
    }
}

fn to_rp_config(config: &UartConfig) -> uart::Config {
    let mut rp = uart::Config::default();
    rp.baudrate = config.baudrate;
    rp.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    rp.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    rp.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    rp
}

impl<'d, T, P, D, I> SerialLink for Rp2040Link<'d, T, P, D, I>
where
    T: Instance,
    P: RxPin<T>,
    D: Channel,
    I: Binding<T::Interrupt, InterruptHandler<T>> + Copy,
{
    type Error = LinkError;

    fn configure(&mut self, config: &UartConfig) -> Result<(), Self::Error> {
        // 125 MHz peripheral clock, divisor must stay within 16 bits
        if config.baudrate == 0 || config.baudrate > 7_812_500 {
            return Err(LinkError::UnsupportedBaud(config.baudrate));
        }

        // Dropping the driver disables the receiver and flushes its FIFO
        self.rx = None;

        // SAFETY: the previous receiver built from these handles was dropped
        // above, so at most one driver owns the peripherals at any time.
        let (uart, pin, dma) = unsafe {
            (
                self.uart.clone_unchecked(),
                self.rx_pin.clone_unchecked(),
                self.dma.clone_unchecked(),
            )
        };
        self.rx = Some(UartRx::new(uart, pin, self.irqs, dma, to_rp_config(config)));
        self.active = Some(*config);
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        let gap = match self.active {
            Some(cfg) => Self::idle_gap(cfg.baudrate),
            None => return Err(LinkError::NotConfigured),
        };
        let rx = self.rx.as_mut().ok_or(LinkError::NotConfigured)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut count = 0;

        while count < buf.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            // Wait the full window for the first byte, then stop at the first idle gap
            let wait = if count == 0 {
                deadline - now
            } else {
                gap.min(deadline - now)
            };

            let mut byte = [0u8; 1];
            match with_timeout(wait, rx.read(&mut byte)).await {
                Ok(Ok(())) => {
                    buf[count] = byte[0];
                    count += 1;
                }
                Ok(Err(uart::Error::Framing | uart::Error::Parity)) => {
                    buf[count] = LINE_ERROR_BYTE;
                    count += 1;
                }
                // Overrun loses bytes but the stream stays usable; break is line noise
                Ok(Err(_)) => {}
                Err(_) => break,
            }
        }

        Ok(count)
    }

    fn release(&mut self) {
        self.rx = None;
        self.active = None;
    }
}
