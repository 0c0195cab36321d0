//! Radio receiver
//!
//! Dispatches events from the radio host stack: characteristic writes go to
//! the [`Inbox`], a dropped connection puts the device back on air.
//!
//! Events can be pushed from the stack's callback with
//! [`RadioReceiver::handle`], or pulled from a [`RadioTransport`] by
//! [`RadioReceiver::serve`].

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::inbox::{Inbox, Message, MAX_MESSAGE_LEN};
use crate::traits::{RadioLink, RadioTransport};

/// Advertised device name
pub const DEVICE_NAME: &str = "PICO_QR";

/// Custom service UUID
pub const SERVICE_UUID: u128 = 0x1234_5678_1234_5678_1234_5678_9abc_def0;

/// Writable characteristic UUID carrying identity messages
pub const WRITE_CHAR_UUID: u128 = 0x1234_5678_1234_5678_1234_5678_9abc_def1;

/// Events delivered by the radio host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent<'a> {
    /// A central connected
    Connected,
    /// The central went away
    Disconnected,
    /// The write characteristic received a value
    Write(&'a [u8]),
}

/// Advertising requests raised from any context, served by a task
pub struct AdvertiseSignal {
    requested: Signal<CriticalSectionRawMutex, ()>,
}

impl AdvertiseSignal {
    /// Create with no request pending (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            requested: Signal::new(),
        }
    }

    /// Wait until advertising is requested; requests made meanwhile coalesce
    pub async fn requested(&self) {
        self.requested.wait().await
    }
}

impl Default for AdvertiseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioLink for AdvertiseSignal {
    fn advertise(&self) {
        self.requested.signal(());
    }
}

/// Radio event sink feeding an inbox
pub struct RadioReceiver<'a, L: RadioLink, const N: usize> {
    inbox: &'a Inbox<N>,
    link: L,
}

impl<'a, L: RadioLink, const N: usize> RadioReceiver<'a, L, N> {
    /// Create a receiver (usable in a `static`)
    pub const fn new(inbox: &'a Inbox<N>, link: L) -> Self {
        Self { inbox, link }
    }

    /// Begin advertising
    pub fn start(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!("advertising as {=str}", DEVICE_NAME);
        self.link.advertise();
    }

    /// Handle one event; callable from interrupt context
    pub fn handle(&self, event: RadioEvent<'_>) {
        match event {
            RadioEvent::Connected => {
                #[cfg(feature = "defmt")]
                defmt::debug!("central connected");
            }
            RadioEvent::Disconnected => {
                #[cfg(feature = "defmt")]
                defmt::debug!("central disconnected, re-advertising");
                self.link.advertise();
            }
            RadioEvent::Write(bytes) => {
                let message = decode_lossy(bytes);
                self.inbox.on_write(&message);
            }
        }
    }

    /// Inbox fed by this receiver
    pub fn inbox(&self) -> &'a Inbox<N> {
        self.inbox
    }
}

impl<'a, const N: usize> RadioReceiver<'a, &'a AdvertiseSignal, N> {
    /// Pump `transport` until it fails
    ///
    /// Advertising requests win over a pending event wait. Returns the
    /// transport's error.
    pub async fn serve<T: RadioTransport>(&self, transport: &mut T) -> T::Error {
        let mut buf = [0u8; MAX_MESSAGE_LEN];
        loop {
            match select(self.link.requested(), transport.next_event(&mut buf)).await {
                Either::First(()) => {
                    if let Err(e) = transport.advertise().await {
                        return e;
                    }
                    #[cfg(feature = "defmt")]
                    defmt::debug!("on air as {=str}", DEVICE_NAME);
                }
                Either::Second(Ok(event)) => self.handle(event),
                Either::Second(Err(e)) => return e,
            }
        }
    }
}

/// Decode UTF-8, skipping invalid sequences
fn decode_lossy(bytes: &[u8]) -> Message {
    let mut out = Message::new();
    'chunks: for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if out.push(c).is_err() {
                break 'chunks;
            }
        }
    }
    out
}
