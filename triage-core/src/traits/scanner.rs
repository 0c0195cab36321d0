//! Code scanner trait

use triage_protocol::ScanCode;

/// A trigger-driven code reader
///
/// Implementations own the serial link and its timing; the orchestrator
/// only decides when to trigger and when to read.
#[allow(async_fn_in_trait)]
pub trait CodeScanner {
    /// Ask the scanner for one read without waiting for an acknowledgement
    fn trigger(&mut self);

    /// Wait for one code
    ///
    /// Returns `None` when the read window closes with nothing received.
    async fn read_code(&mut self) -> Option<ScanCode>;
}
