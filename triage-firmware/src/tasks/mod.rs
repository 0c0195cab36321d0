//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! [`crate::channels`].

pub mod radio;
pub mod triage;

pub use radio::radio_task;
pub use triage::{triage_task, PanelBankHw, ScannerHw};
