//! Triage task
//!
//! Owns the scanner and the panel bank and runs the orchestrator forever.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_rp::uart::BufferedUart;
use triage_core::{Orchestrator, StationConfig};
use triage_drivers::panel::{DemuxBus, PanelBank};
use triage_drivers::scanner::Gm805;

use crate::board::{PANEL_COUNT, SELECT_LINES};
use crate::channels::INBOX;
use crate::clock::EmbassyClock;

/// Scanner on the buffered UART
pub type ScannerHw = Gm805<BufferedUart, EmbassyClock>;

type PanelBus = DemuxBus<
    Spi<'static, SPI0, Blocking>,
    Output<'static>,
    Output<'static>,
    EmbassyClock,
    SELECT_LINES,
>;

/// Panels on the demultiplexed SPI bus
pub type PanelBankHw = PanelBank<'static, PanelBus, Output<'static>, PANEL_COUNT>;

/// Triage task - scanner and radio arms over one panel bank
#[embassy_executor::task]
pub async fn triage_task(mut scanner: ScannerHw, bank: PanelBankHw, config: StationConfig) {
    info!("Triage task started ({} slots)", config.slots());

    if !scanner.set_command_trigger_mode(false) {
        warn!("Scanner did not acknowledge command-trigger mode");
    }

    let orchestrator = Orchestrator::new(config, bank, &INBOX);
    orchestrator.show_idle();

    let mut delay = EmbassyClock;
    orchestrator.run(&mut scanner, &mut delay).await;
}
