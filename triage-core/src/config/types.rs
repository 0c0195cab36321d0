//! Station configuration type definitions

use crate::state::MAX_PANELS;

/// Default number of panels on the demultiplexed bus
pub const DEFAULT_PANEL_COUNT: usize = 4;

/// Scanner timing, all values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScannerTiming {
    /// Pause between firing the trigger and starting the read
    pub trigger_settle_ms: u32,
    /// Overall bound on one code read
    pub read_timeout_ms: u32,
    /// Silence after the first byte that ends a read
    pub idle_gap_ms: u32,
    /// Pause after each read before the next trigger
    pub cooldown_ms: u32,
    /// Bound on a command acknowledgement wait
    pub ack_timeout_ms: u32,
}

impl Default for ScannerTiming {
    fn default() -> Self {
        Self {
            trigger_settle_ms: 50,
            read_timeout_ms: 2000,
            idle_gap_ms: 40,
            cooldown_ms: 2000,
            ack_timeout_ms: 300,
        }
    }
}

/// Station configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StationConfig {
    /// Number of triage slots (one per panel)
    pub panel_count: usize,
    /// Scanner timing
    pub scanner: ScannerTiming,
    /// Send real CRCs instead of the checksum placeholder
    pub use_crc: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            panel_count: DEFAULT_PANEL_COUNT,
            scanner: ScannerTiming::default(),
            use_crc: false,
        }
    }
}

impl StationConfig {
    /// Set the panel count, clamped to `1..=MAX_PANELS`
    pub fn with_panel_count(mut self, count: usize) -> Self {
        self.panel_count = count.clamp(1, MAX_PANELS);
        self
    }

    /// Panel count as used for slot allocation
    pub fn slots(&self) -> usize {
        self.panel_count.clamp(1, MAX_PANELS)
    }
}
