//! Radio link traits

use crate::radio::RadioEvent;

/// Control surface of the radio host stack
///
/// Callable from interrupt context, so implementations only record the
/// request. The receiver uses it to put the device back on air.
pub trait RadioLink {
    /// Start (or restart) advertising
    fn advertise(&self);
}

impl<T: RadioLink + ?Sized> RadioLink for &T {
    fn advertise(&self) {
        (**self).advertise()
    }
}

/// Radio host stack driven from a task
///
/// The stack owns advertising payloads and the GATT server; this is only
/// the part the receiver needs.
#[allow(async_fn_in_trait)]
pub trait RadioTransport {
    /// Transport failure
    type Error;

    /// Go on air under [`DEVICE_NAME`](crate::radio::DEVICE_NAME) offering
    /// [`SERVICE_UUID`](crate::radio::SERVICE_UUID)
    async fn advertise(&mut self) -> Result<(), Self::Error>;

    /// Wait for the next connection change or characteristic write
    ///
    /// Written values are copied into `buf` and truncated to its length.
    /// Must be cancel-safe: the wait is dropped when an advertising request
    /// comes in first.
    async fn next_event<'b>(&mut self, buf: &'b mut [u8]) -> Result<RadioEvent<'b>, Self::Error>;
}
