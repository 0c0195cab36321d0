//! Statics shared between the radio receiver and the tasks

use triage_core::inbox::{Inbox, DEFAULT_CAPACITY};
use triage_core::radio::AdvertiseSignal;

/// Identity messages written by the radio central
pub static INBOX: Inbox<DEFAULT_CAPACITY> = Inbox::new();

/// Raised when the radio should (re)start advertising
pub static ADVERTISE: AdvertiseSignal = AdvertiseSignal::new();
