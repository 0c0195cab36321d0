//! UART link configuration
//!
//! Serial line settings for the scanner link. The firmware maps these onto
//! the chip HAL's own configuration struct.

/// Baud rate the GM805 ships with
pub const SCANNER_DEFAULT_BAUD: u32 = 9600;

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::scanner()
    }
}

impl UartConfig {
    /// 8N1 at the scanner's factory baud rate
    pub const fn scanner() -> Self {
        Self {
            baudrate: SCANNER_DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Same framing, different baud rate
    pub const fn with_baudrate(self, baudrate: u32) -> Self {
        Self { baudrate, ..self }
    }

    /// Time to shift one character out, in microseconds (rounded up)
    ///
    /// Includes the start bit. The scanner driver floors its idle gap on it.
    pub fn char_time_us(&self) -> u32 {
        let bits = 1
            + self.data_bits.count()
            + u32::from(self.parity != Parity::None)
            + self.stop_bits.count();
        (bits * 1_000_000).div_ceil(self.baudrate.max(1))
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

impl DataBits {
    fn count(self) -> u32 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    fn count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}
