//! Radio glue
//!
//! [`RADIO`] feeds the shared inbox. The radio task pulls events from a
//! [`RadioTransport`] into it, and advertising requests raised by the
//! receiver (at start and after a disconnect) are served by the same task.

use defmt::Format;
use triage_core::inbox::DEFAULT_CAPACITY;
use triage_core::radio::{AdvertiseSignal, RadioEvent, RadioReceiver};
use triage_core::traits::RadioTransport;

use crate::channels::{ADVERTISE, INBOX};

/// Receiver wired to the shared inbox
pub static RADIO: RadioReceiver<'static, &'static AdvertiseSignal, DEFAULT_CAPACITY> =
    RadioReceiver::new(&INBOX, &ADVERTISE);

/// Transport the board is built with
pub type RadioHw = NoHostStack;

/// Radio transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RadioError {
    /// No host stack is linked for the radio chip
    NoHostStack,
}

/// Transport for boards built without a radio host stack
///
/// Refuses to advertise, so the radio task reports the missing stack once
/// and the station keeps scanning.
pub struct NoHostStack;

impl RadioTransport for NoHostStack {
    type Error = RadioError;

    async fn advertise(&mut self) -> Result<(), RadioError> {
        Err(RadioError::NoHostStack)
    }

    async fn next_event<'b>(&mut self, _buf: &'b mut [u8]) -> Result<RadioEvent<'b>, RadioError> {
        core::future::pending().await
    }
}
