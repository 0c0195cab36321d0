//! Embassy-backed time for the drivers

use embassy_time::{block_for, Duration, Instant, Timer};
use triage_hal::Clock;

/// Monotonic clock and delay source on the embassy time driver
///
/// Blocking delays spin on the timer; async delays yield to the executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

impl embedded_hal::delay::DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        block_for(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}

impl embedded_hal_async::delay::DelayNs for EmbassyClock {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after_nanos(u64::from(ns)).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(u64::from(ms)).await;
    }
}
