//! Triage Station Hardware Abstraction Layer
//!
//! Chip-independent types shared by the drivers and the firmware. Bus
//! traffic itself goes through the `embedded-hal` / `embedded-io` traits;
//! this crate only adds what those traits leave out:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  triage-firmware (embassy-rp wiring)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  triage-drivers (GM805, ST7735 bank)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  triage-hal (this crate)                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Contents
//!
//! - [`time::Clock`] - Monotonic millisecond time source for timeouts
//! - [`uart::UartConfig`] - Serial line settings (scanner link)
//! - [`spi::SpiConfig`] - SPI bus settings (panel bus)

#![no_std]
#![deny(unsafe_code)]

pub mod spi;
pub mod time;
pub mod uart;

pub use spi::SpiConfig;
pub use time::Clock;
pub use uart::UartConfig;
