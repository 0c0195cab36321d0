//! Slot display trait for the panel bank

use triage_protocol::IdentityRecord;

/// Errors that can occur while painting a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Slot index has no panel
    InvalidSlot,
    /// Panel has not finished initialisation
    NotReady,
    /// SPI or control line failure
    Bus,
    /// Bitmap asset could not be drawn
    Asset,
}

/// One panel per triage slot
///
/// Every call paints and flushes the whole panel.
pub trait SlotDisplay {
    /// Number of slots (panels)
    fn slot_count(&self) -> usize;

    /// Paint the idle screen
    fn show_idle(&mut self, slot: usize) -> Result<(), DisplayError>;

    /// Paint a scanned identity awaiting confirmation
    fn paint_pending(&mut self, slot: usize, record: &IdentityRecord) -> Result<(), DisplayError>;

    /// Paint a confirmed identity, route badge included
    fn paint_confirmed(&mut self, slot: usize, record: &IdentityRecord)
        -> Result<(), DisplayError>;

    /// Paint the idle screen on every slot, stopping at the first failure
    fn show_idle_all(&mut self) -> Result<(), DisplayError> {
        for slot in 0..self.slot_count() {
            self.show_idle(slot)?;
        }
        Ok(())
    }
}
