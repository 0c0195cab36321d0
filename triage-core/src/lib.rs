//! Board-agnostic core logic for the triage station
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (scanner, slot display, radio link)
//! - Interrupt-safe radio inbox and the radio event receiver
//! - Triage slot state machine
//! - Orchestrator loop tying scanner, radio and panels together
//! - Station configuration

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod inbox;
pub mod orchestrator;
pub mod radio;
pub mod state;
pub mod traits;

pub use config::StationConfig;
pub use inbox::{Inbox, Message};
pub use orchestrator::Orchestrator;
pub use radio::{RadioEvent, RadioReceiver};
pub use state::{Outcome, SlotTag, TriageState};
