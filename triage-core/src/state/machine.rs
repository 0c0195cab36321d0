//! Triage slot table
//!
//! One slot per panel. Pending assignments walk the slots strictly
//! round-robin and overwrite whatever was there, confirmed or not. An
//! explicit id→slot map answers "which slot shows this id" and is cleaned
//! up when a slot is reused.

use heapless::{FnvIndexMap, FnvIndexSet, Vec};
use triage_protocol::{IdentityRecord, PatientId};

use super::events::{Event, Outcome};

/// Upper bound on panels (and so on tracked ids)
pub const MAX_PANELS: usize = 8;

/// Display state of an occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotTag {
    /// Scanned, waiting for the radio
    Pending,
    /// Matched by a radio message
    Confirmed,
}

/// An occupied slot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot {
    /// Identity shown on the panel
    pub record: IdentityRecord,
    /// Pending or confirmed
    pub tag: SlotTag,
}

/// Orchestrator state: slot table, round-robin cursor and lookup tables
#[derive(Debug, Clone)]
pub struct TriageState {
    slots: Vec<Option<Slot>, MAX_PANELS>,
    /// Next slot to claim
    cursor: usize,
    /// Pending assignments made since start-up
    assignments: u32,
    /// Id of the previous scan, for debouncing
    last_scanned: Option<PatientId>,
    /// Slot currently showing each id
    owners: FnvIndexMap<PatientId, usize, MAX_PANELS>,
    /// Ids whose slot has been confirmed
    confirmed: FnvIndexSet<PatientId, MAX_PANELS>,
}

impl TriageState {
    /// Create an empty table with `panel_count` slots (clamped to `1..=MAX_PANELS`)
    pub fn new(panel_count: usize) -> Self {
        let mut slots = Vec::new();
        for _ in 0..panel_count.clamp(1, MAX_PANELS) {
            let _ = slots.push(None);
        }
        Self {
            slots,
            cursor: 0,
            assignments: 0,
            last_scanned: None,
            owners: FnvIndexMap::new(),
            confirmed: FnvIndexSet::new(),
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: Event) -> Outcome {
        match event {
            Event::Scanned(record) => self.on_scanned(record),
            Event::Received(record) => self.on_received(record),
        }
    }

    fn on_scanned(&mut self, record: IdentityRecord) -> Outcome {
        if self.last_scanned.as_ref() == Some(&record.id) {
            return Outcome::Repeated;
        }
        self.last_scanned = Some(record.id.clone());

        let slot = self.cursor;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.assignments = self.assignments.wrapping_add(1);

        let evicted = self.slots[slot].take().map(|old| {
            self.release(&old.record.id, slot);
            old.record.id
        });

        // A rescan makes the id pending again wherever it was shown before
        self.confirmed.remove(&record.id);
        // At most one entry per slot survives `release`, so this fits
        let _ = self.owners.insert(record.id.clone(), slot);
        self.slots[slot] = Some(Slot {
            record,
            tag: SlotTag::Pending,
        });

        Outcome::Assigned { slot, evicted }
    }

    fn on_received(&mut self, record: IdentityRecord) -> Outcome {
        let Some(&slot) = self.owners.get(&record.id) else {
            return Outcome::Unmatched;
        };

        let first = self.confirmed.insert(record.id.clone()).unwrap_or(false);
        self.slots[slot] = Some(Slot {
            record,
            tag: SlotTag::Confirmed,
        });

        Outcome::Confirmed { slot, first }
    }

    /// Drop `id`'s lookup entries if they still point at `slot`
    fn release(&mut self, id: &PatientId, slot: usize) {
        if self.owners.get(id) == Some(&slot) {
            self.owners.remove(id);
            self.confirmed.remove(id);
        }
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Contents of one slot
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Slot currently showing `id`
    pub fn owner_of(&self, id: &str) -> Option<usize> {
        self.owners
            .iter()
            .find(|(key, _)| key.as_str() == id)
            .map(|(_, &slot)| slot)
    }

    /// Whether `id` has been confirmed on its current slot
    pub fn is_confirmed(&self, id: &str) -> bool {
        self.confirmed.iter().any(|key| key.as_str() == id)
    }

    /// Number of confirmed ids
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    /// Pending assignments since start-up
    pub fn assignments(&self) -> u32 {
        self.assignments
    }

    /// Id of the previous scan
    pub fn last_scanned(&self) -> Option<&str> {
        self.last_scanned.as_ref().map(|id| id.as_str())
    }
}
