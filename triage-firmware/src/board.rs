//! Board wiring for the Pico 2 W triage station
//!
//! | Signal            | GPIO |
//! |-------------------|------|
//! | Scanner UART0 TX  | 12   |
//! | Scanner UART0 RX  | 13   |
//! | Panel SPI0 SCK    | 18   |
//! | Panel SPI0 MOSI   | 19   |
//! | Panel DC          | 14   |
//! | Panel reset       | 15   |
//! | Demux select A0-2 | 7-9  |

use embassy_rp::spi;
use embassy_rp::uart;
use triage_hal::spi::{Phase, Polarity};
use triage_hal::uart::{DataBits, Parity, StopBits};
use triage_hal::{SpiConfig, UartConfig};

/// Panels fitted
pub const PANEL_COUNT: usize = 4;

/// Demultiplexer address of each slot's panel
pub const PANEL_ADDRESSES: [u8; PANEL_COUNT] = [0, 1, 2, 3];

/// Select lines wired to the demultiplexer
pub const SELECT_LINES: usize = 3;

/// Scanner UART ring buffer sizes
pub const UART_TX_BUF: usize = 64;
pub const UART_RX_BUF: usize = 256;

/// Logo shown on every screen
pub static LOGO: &[u8] = include_bytes!("../assets/logo.bmp");

/// Map the serial settings onto the RP UART
pub fn uart_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}

/// Map the bus settings onto the RP SPI
pub fn spi_config(config: &SpiConfig) -> spi::Config {
    let mut out = spi::Config::default();
    out.frequency = config.frequency;
    out.polarity = match config.polarity {
        Polarity::IdleLow => spi::Polarity::IdleLow,
        Polarity::IdleHigh => spi::Polarity::IdleHigh,
    };
    out.phase = match config.phase {
        Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
        Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
    };
    out
}
