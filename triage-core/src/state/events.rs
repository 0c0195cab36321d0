//! Events fed into the triage state and their outcomes

use triage_protocol::{IdentityRecord, PatientId};

/// An identity arriving from one of the two sources
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Read by the barcode scanner
    Scanned(IdentityRecord),
    /// Written over the radio
    Received(IdentityRecord),
}

/// What handling an event changed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// New pending identity placed in `slot`
    Assigned {
        slot: usize,
        /// Identity that previously occupied the slot
        evicted: Option<PatientId>,
    },
    /// Same identity as the previous scan
    Repeated,
    /// Slot now shows the identity as confirmed
    Confirmed {
        slot: usize,
        /// False when the id was already confirmed
        first: bool,
    },
    /// No slot shows this identity
    Unmatched,
}

impl Outcome {
    /// Slot that needs repainting, if any
    pub fn slot(&self) -> Option<usize> {
        match self {
            Outcome::Assigned { slot, .. } | Outcome::Confirmed { slot, .. } => Some(*slot),
            Outcome::Repeated | Outcome::Unmatched => None,
        }
    }
}
