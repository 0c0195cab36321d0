//! Triage Station - Patient/Syringe Matching Firmware
//!
//! Main firmware binary for RP2350-based (Pico 2 W class) triage stations.
//! A GM805 scanner reads the identity printed on a syringe, a radio central
//! writes the identity it expects, and a bank of ST7735 panels shows which
//! slots are pending and which are confirmed.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::Spi;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use triage_core::StationConfig;
use triage_drivers::panel::st7735::FRAME_BYTES;
use triage_drivers::panel::{DemuxBus, Panel, PanelBank, PanelConfig};
use triage_drivers::scanner::{Gm805, Gm805Config};
use triage_hal::{SpiConfig, UartConfig};

use crate::board::{PANEL_ADDRESSES, PANEL_COUNT, UART_RX_BUF, UART_TX_BUF};
use crate::clock::EmbassyClock;

mod board;
mod channels;
mod clock;
mod radio;
mod tasks;

/// Image definition read by the RP2350 boot ROM
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: embassy_rp::block::ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// UART ring buffers (must live forever)
static TX_BUF: StaticCell<[u8; UART_TX_BUF]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_RX_BUF]> = StaticCell::new();

// Framebuffers and flush buffers, one pair per panel. Const-initialised so
// they are placed in .bss instead of being built on the stack.
static FRAMES: ConstStaticCell<[[u8; FRAME_BYTES]; PANEL_COUNT]> =
    ConstStaticCell::new([[0; FRAME_BYTES]; PANEL_COUNT]);
static SCRATCH: ConstStaticCell<[[u8; FRAME_BYTES]; PANEL_COUNT]> =
    ConstStaticCell::new([[0; FRAME_BYTES]; PANEL_COUNT]);

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Triage station firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = StationConfig::default().with_panel_count(PANEL_COUNT);

    // Scanner link: UART0 on GP12 (TX) / GP13 (RX)
    let uart_settings = UartConfig::scanner();
    let tx_buf = TX_BUF.init([0u8; UART_TX_BUF]);
    let rx_buf = RX_BUF.init([0u8; UART_RX_BUF]);
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_12,
        p.PIN_13,
        Irqs,
        tx_buf,
        rx_buf,
        board::uart_config(&uart_settings),
    );
    let scanner_config = Gm805Config::from_station(&config).for_link(&uart_settings);
    let scanner = Gm805::new(uart, EmbassyClock, scanner_config);
    info!("Scanner UART initialized at {} baud", uart_settings.baudrate);

    // Panel bus: SPI0 on GP18 (SCK) / GP19 (MOSI), write only
    let spi_settings = SpiConfig::default();
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, board::spi_config(&spi_settings));
    let dc = Output::new(p.PIN_14, Level::Low);
    let reset = Output::new(p.PIN_15, Level::High);
    let select = [
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
    ];
    let bus = DemuxBus::new(spi, dc, select, EmbassyClock);

    let [f0, f1, f2, f3] = FRAMES.take();
    let [s0, s1, s2, s3] = SCRATCH.take();
    let panels = [
        panel(PANEL_ADDRESSES[0], f0, s0),
        panel(PANEL_ADDRESSES[1], f1, s1),
        panel(PANEL_ADDRESSES[2], f2, s2),
        panel(PANEL_ADDRESSES[3], f3, s3),
    ];

    let mut bank = PanelBank::new(bus, reset, panels, board::LOGO);
    match bank.init() {
        Ok(()) => info!("{} panels initialized", PANEL_COUNT),
        // Slots on failed panels report NotReady on every paint
        Err(e) => error!("Panel init failed: {}", e),
    }

    // Spawn tasks
    unwrap!(spawner.spawn(tasks::radio_task(radio::NoHostStack)));
    unwrap!(spawner.spawn(tasks::triage_task(scanner, bank, config)));

    radio::RADIO.start();
    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!(
            "Main loop heartbeat, {} messages queued",
            channels::INBOX.len()
        );
    }
}

/// Create one panel over its static buffers
fn panel(address: u8, frame: &'static mut [u8], scratch: &'static mut [u8]) -> Panel<'static> {
    unwrap!(Panel::new(address, PanelConfig::default(), frame, scratch))
}
