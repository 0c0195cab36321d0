//! Panel bank: one ST7735 per triage slot
//!
//! Every panel shares the bus and the reset line. Slot `i` is panel `i`,
//! whatever demultiplexer address that panel was given.
//!
//! Screens, drawn in landscape:
//!
//! | Screen    | Background | Content                              |
//! |-----------|------------|--------------------------------------|
//! | idle      | red        | logo                                 |
//! | pending   | yellow     | logo, id, name                       |
//! | confirmed | green      | logo, id, name, magnified route badge |

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::digital::OutputPin;
use triage_core::traits::{DisplayError, SlotDisplay};
use triage_protocol::IdentityRecord;

use super::bmp::Bmp24;
use super::bus::PanelBus;
use super::st7735::{Panel, PanelError};
use super::text::Scaled;

/// Reset line held low for this long
pub const RESET_LOW_MS: u32 = 50;
/// Wait after releasing reset
pub const RESET_RELEASE_MS: u32 = 120;

/// Logo top-left corner
pub const LOGO_ORIGIN: Point = Point::new(10, 10);
/// Logo pixels of this colour are transparent
pub const LOGO_COLOR_KEY: Rgb888 = Rgb888::WHITE;
/// Patient id top-left corner
pub const ID_ORIGIN: Point = Point::new(80, 20);
/// Patient name top-left corner
pub const NAME_ORIGIN: Point = Point::new(60, 40);
/// Route badge top-left corner
pub const BADGE_ORIGIN: Point = Point::new(65, 75);
/// Route badge magnification
pub const BADGE_SCALE: u32 = 4;

pub const IDLE_BACKGROUND: Rgb565 = Rgb565::RED;
pub const PENDING_BACKGROUND: Rgb565 = Rgb565::YELLOW;
pub const CONFIRMED_BACKGROUND: Rgb565 = Rgb565::GREEN;
pub const TEXT_COLOR: Rgb565 = Rgb565::BLACK;

impl From<PanelError> for DisplayError {
    fn from(e: PanelError) -> Self {
        match e {
            PanelError::NotReady => DisplayError::NotReady,
            PanelError::Bus | PanelError::BufferTooSmall => DisplayError::Bus,
        }
    }
}

#[derive(Clone, Copy)]
enum Screen<'r> {
    Idle,
    Pending(&'r IdentityRecord),
    Confirmed(&'r IdentityRecord),
}

/// `P` panels on one bus with a shared reset line
pub struct PanelBank<'a, B, R, const P: usize> {
    bus: B,
    reset: R,
    panels: [Panel<'a>; P],
    logo: &'a [u8],
}

impl<'a, B, R, const P: usize> PanelBank<'a, B, R, P>
where
    B: PanelBus,
    R: OutputPin,
{
    /// Create a bank; `logo` is a 24-bit BMP file
    pub fn new(bus: B, reset: R, panels: [Panel<'a>; P], logo: &'a [u8]) -> Self {
        Self {
            bus,
            reset,
            panels,
            logo,
        }
    }

    /// Pulse the shared reset line
    pub fn hardware_reset(&mut self) -> Result<(), PanelError> {
        self.reset.set_low().map_err(|_| PanelError::Bus)?;
        self.bus.delay_ms(RESET_LOW_MS);
        self.reset.set_high().map_err(|_| PanelError::Bus)?;
        self.bus.delay_ms(RESET_RELEASE_MS);
        Ok(())
    }

    /// Reset and initialise every panel
    ///
    /// A panel that fails is left uninitialised and the rest are still
    /// brought up; the first failure is returned.
    pub fn init(&mut self) -> Result<(), PanelError> {
        self.hardware_reset()?;

        let mut result = Ok(());
        for panel in self.panels.iter_mut() {
            if let Err(e) = panel.init(&mut self.bus) {
                #[cfg(feature = "defmt")]
                defmt::error!("panel {} init failed: {}", panel.address(), e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Panels in slot order
    pub fn panels(&self) -> &[Panel<'a>] {
        &self.panels
    }

    /// Release the bus, reset line and panels
    pub fn release(self) -> (B, R, [Panel<'a>; P]) {
        (self.bus, self.reset, self.panels)
    }

    fn paint(&mut self, slot: usize, screen: Screen<'_>) -> Result<(), DisplayError> {
        let panel = self.panels.get_mut(slot).ok_or(DisplayError::InvalidSlot)?;

        let background = match screen {
            Screen::Idle => IDLE_BACKGROUND,
            Screen::Pending(_) => PENDING_BACKGROUND,
            Screen::Confirmed(_) => CONFIRMED_BACKGROUND,
        };
        panel.clear(background)?;

        let style = MonoTextStyle::new(&FONT_6X10, TEXT_COLOR);
        if let Screen::Pending(record) | Screen::Confirmed(record) = screen {
            Text::with_baseline(&record.id, ID_ORIGIN, style, Baseline::Top).draw(panel)?;
            Text::with_baseline(&record.name, NAME_ORIGIN, style, Baseline::Top).draw(panel)?;
        }
        if let Screen::Confirmed(record) = screen {
            let mut badge = Scaled::new(panel, BADGE_SCALE, BADGE_ORIGIN);
            Text::with_baseline(record.route_badge(), Point::zero(), style, Baseline::Top)
                .draw(&mut badge)?;
        }

        // A broken logo is reported, but the rest of the screen still goes out
        let logo = match Bmp24::parse(self.logo) {
            Ok(bmp) => {
                bmp.draw(panel, LOGO_ORIGIN, Some(LOGO_COLOR_KEY))?;
                Ok(())
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("logo unusable: {}", _e);
                Err(DisplayError::Asset)
            }
        };

        panel.show(&mut self.bus)?;
        logo
    }
}

impl<B, R, const P: usize> SlotDisplay for PanelBank<'_, B, R, P>
where
    B: PanelBus,
    R: OutputPin,
{
    fn slot_count(&self) -> usize {
        P
    }

    fn show_idle(&mut self, slot: usize) -> Result<(), DisplayError> {
        self.paint(slot, Screen::Idle)
    }

    fn paint_pending(&mut self, slot: usize, record: &IdentityRecord) -> Result<(), DisplayError> {
        self.paint(slot, Screen::Pending(record))
    }

    fn paint_confirmed(
        &mut self,
        slot: usize,
        record: &IdentityRecord,
    ) -> Result<(), DisplayError> {
        self.paint(slot, Screen::Confirmed(record))
    }
}
