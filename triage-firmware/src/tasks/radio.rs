//! Radio task
//!
//! Serves the radio transport: advertising requests from the receiver and
//! events from the central, outside interrupt context.

use defmt::*;
use triage_core::radio::{DEVICE_NAME, SERVICE_UUID, WRITE_CHAR_UUID};

use crate::channels::INBOX;
use crate::radio::{RadioHw, RADIO};

/// Radio task - runs until the transport fails
#[embassy_executor::task]
pub async fn radio_task(mut transport: RadioHw) {
    info!(
        "Radio: {=str}, service {=u128:x}, write characteristic {=u128:x}",
        DEVICE_NAME, SERVICE_UUID, WRITE_CHAR_UUID
    );

    let e = RADIO.serve(&mut transport).await;
    error!(
        "Radio stopped: {} ({} queued, {} dropped), scanner only",
        e,
        INBOX.len(),
        INBOX.dropped()
    );
}
