//! GM805 zone-bit map
//!
//! The scanner is configured through a table of byte-wide "zones". Only the
//! zones the station touches are modelled here.

/// A configuration zone address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Zone {
    /// Operating mode, bits 0-1
    Mode = 0x0000,
    /// Command-mode trigger, bit 0 (cleared by the scanner after a read)
    Trigger = 0x0002,
}

impl Zone {
    /// Zone address on the wire
    pub const fn address(self) -> u16 {
        self as u16
    }
}

/// Mask of the mode bits inside [`Zone::Mode`]
pub const MODE_MASK: u8 = 0b0000_0011;

/// Trigger bit inside [`Zone::Trigger`]
pub const TRIGGER_BIT: u8 = 0b0000_0001;

/// Scanner operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanMode {
    /// Scans while the physical button is held
    Manual,
    /// Scans when the host sets the trigger bit
    Command,
    /// Scans continuously
    Continuous,
    /// Scans when the sensor detects an object
    Induction,
}

impl ScanMode {
    /// Mode bits as stored in the mode zone
    pub const fn bits(self) -> u8 {
        match self {
            ScanMode::Manual => 0b00,
            ScanMode::Command => 0b01,
            ScanMode::Continuous => 0b10,
            ScanMode::Induction => 0b11,
        }
    }

    /// Decode the mode bits of a mode-zone byte
    pub const fn from_zone(value: u8) -> Self {
        match value & MODE_MASK {
            0b00 => ScanMode::Manual,
            0b01 => ScanMode::Command,
            0b10 => ScanMode::Continuous,
            _ => ScanMode::Induction,
        }
    }

    /// Replace the mode bits of `current`, leaving the other bits alone
    pub const fn apply(self, current: u8) -> u8 {
        (current & !MODE_MASK) | self.bits()
    }
}

/// Link-check frame from the device manual, sent as-is
pub const HEARTBEAT_FRAME: [u8; 16] = [
    0x7E, 0x00, 0x0A, 0x01, 0x00, 0x00, 0x00, 0x30, 0x1A, 0x03, 0x00, 0x00, 0x01, 0x00, 0x33,
    0x31,
];
