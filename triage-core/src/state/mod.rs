//! Triage slot state machine
//!
//! Scanner identities claim panel slots round-robin as pending; radio
//! identities confirm the slot that currently shows them.

pub mod events;
pub mod machine;

pub use events::{Event, Outcome};
pub use machine::{Slot, SlotTag, TriageState, MAX_PANELS};
