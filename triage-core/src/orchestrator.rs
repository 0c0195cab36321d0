//! Triage orchestrator
//!
//! Two cooperative arms share one [`TriageState`] and one slot display:
//!
//! - the scan arm triggers the scanner, waits for a code and claims a slot
//! - the radio arm drains the inbox and confirms slots
//!
//! Both arms run inside a single task via `join`. Handlers are synchronous,
//! so no `RefCell` borrow is ever held across an `.await`.

use core::cell::{Ref, RefCell};

use embassy_futures::join::join;
use embedded_hal_async::delay::DelayNs;
use triage_protocol::{IdentityRecord, ScanCode};

use crate::config::StationConfig;
use crate::inbox::Inbox;
use crate::state::{Event, Outcome, TriageState};
use crate::traits::{CodeScanner, SlotDisplay};

/// Owns the triage state and the panel bank
pub struct Orchestrator<'a, D: SlotDisplay, const N: usize> {
    config: StationConfig,
    state: RefCell<TriageState>,
    display: RefCell<D>,
    inbox: &'a Inbox<N>,
}

impl<'a, D: SlotDisplay, const N: usize> Orchestrator<'a, D, N> {
    /// Create an orchestrator; slot count is the smaller of the config and the display
    pub fn new(config: StationConfig, display: D, inbox: &'a Inbox<N>) -> Self {
        let slots = config.slots().min(display.slot_count().max(1));
        Self {
            config,
            state: RefCell::new(TriageState::new(slots)),
            display: RefCell::new(display),
            inbox,
        }
    }

    /// Paint the idle screen on every panel
    pub fn show_idle(&self) {
        if let Err(_e) = self.display.borrow_mut().show_idle_all() {
            #[cfg(feature = "defmt")]
            defmt::warn!("idle screen failed: {}", _e);
        }
    }

    /// Run both arms forever
    pub async fn run<S, T>(&self, scanner: &mut S, delay: &mut T)
    where
        S: CodeScanner,
        T: DelayNs,
    {
        join(self.scan_arm(scanner, delay), self.radio_arm()).await;
    }

    /// Trigger, settle, read, handle, cool down
    pub async fn scan_arm<S, T>(&self, scanner: &mut S, delay: &mut T)
    where
        S: CodeScanner,
        T: DelayNs,
    {
        let timing = self.config.scanner;
        loop {
            scanner.trigger();
            delay.delay_ms(timing.trigger_settle_ms).await;

            match scanner.read_code().await {
                Some(code) => {
                    self.on_code(&code);
                }
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("no read");
                }
            }

            delay.delay_ms(timing.cooldown_ms).await;
        }
    }

    /// Wait for radio messages and handle them
    pub async fn radio_arm(&self) {
        loop {
            let message = self.inbox.get_message().await;
            self.on_message(&message);
        }
    }

    /// Handle one scanner code
    ///
    /// Returns `None` when the code is not an identity message.
    pub fn on_code(&self, code: &ScanCode) -> Option<Outcome> {
        let Some(record) = code.as_text().and_then(IdentityRecord::parse) else {
            #[cfg(feature = "defmt")]
            defmt::debug!("ignoring scan {}", code);
            return None;
        };
        Some(self.dispatch(Event::Scanned(record)))
    }

    /// Handle one radio message
    pub fn on_message(&self, message: &str) -> Option<Outcome> {
        let Some(record) = IdentityRecord::parse(message) else {
            #[cfg(feature = "defmt")]
            defmt::debug!("ignoring radio message {=str}", message);
            return None;
        };
        Some(self.dispatch(Event::Received(record)))
    }

    fn dispatch(&self, event: Event) -> Outcome {
        let outcome = self.state.borrow_mut().handle(event);

        if let Some(slot) = outcome.slot() {
            let state = self.state.borrow();
            if let Some(entry) = state.slot(slot) {
                let mut display = self.display.borrow_mut();
                let painted = match outcome {
                    Outcome::Assigned { .. } => display.paint_pending(slot, &entry.record),
                    _ => display.paint_confirmed(slot, &entry.record),
                };
                if let Err(_e) = painted {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("paint slot {} failed: {}", slot, _e);
                }
            }
        }

        #[cfg(feature = "defmt")]
        defmt::info!("{}", outcome);
        outcome
    }

    /// Current triage state
    pub fn state(&self) -> Ref<'_, TriageState> {
        self.state.borrow()
    }

    /// Panel bank
    pub fn display(&self) -> Ref<'_, D> {
        self.display.borrow()
    }

    /// Station configuration
    pub fn config(&self) -> &StationConfig {
        &self.config
    }
}
