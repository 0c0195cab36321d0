//! Monotonic time source
//!
//! Drivers that bound their waits (ack timeouts, idle gaps) read time
//! through this trait so the same code runs against the embassy time driver
//! on target and a simulated clock in host tests. Sleeping is done through
//! `embedded_hal::delay::DelayNs` / `embedded_hal_async::delay::DelayNs`.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    ///
    /// Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `start`
    fn elapsed_ms(&self, start: u64) -> u64 {
        self.now_ms().saturating_sub(start)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
