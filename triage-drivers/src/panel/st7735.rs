//! ST7735 TFT panel (RGB565, framebuffered)
//!
//! Each panel keeps a full framebuffer in RAM and is drawn through
//! `embedded-graphics`. Nothing reaches the glass until [`Panel::show`]
//! copies the framebuffer out in one transfer.
//!
//! # Initialisation
//!
//! ```text
//! Uninitialized → Reset → SleepOut → ColorModeSet → OrientationSet
//!               → DisplayOn → Ready
//! ```
//!
//! The shared hardware reset line is pulsed once for all panels by the
//! bank before any panel starts this sequence.

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

use super::bus::PanelBus;

/// ST7735 command bytes
pub mod cmd {
    /// Software reset
    pub const SWRESET: u8 = 0x01;
    /// Sleep out
    pub const SLPOUT: u8 = 0x11;
    /// Normal display mode on
    pub const NORON: u8 = 0x13;
    /// Display inversion on
    pub const INVON: u8 = 0x20;
    /// Display on
    pub const DISPON: u8 = 0x29;
    /// Column address set
    pub const CASET: u8 = 0x2A;
    /// Row address set
    pub const RASET: u8 = 0x2B;
    /// Memory write
    pub const RAMWR: u8 = 0x2C;
    /// Memory data access control
    pub const MADCTL: u8 = 0x36;
    /// Interface pixel format
    pub const COLMOD: u8 = 0x3A;
}

/// COLMOD parameter for 16 bits per pixel
const COLMOD_16BPP: u8 = 0x05;

/// MADCTL colour order bit
const MADCTL_BGR: u8 = 0x08;

const SWRESET_DELAY_MS: u32 = 150;
const SLPOUT_DELAY_MS: u32 = 120;
const DISPON_DELAY_MS: u32 = 50;

/// Native panel width in pixels
pub const NATIVE_WIDTH: u16 = 128;
/// Native panel height in pixels
pub const NATIVE_HEIGHT: u16 = 160;

/// Framebuffer size for a native-size panel
pub const FRAME_BYTES: usize = NATIVE_WIDTH as usize * NATIVE_HEIGHT as usize * 2;

/// Panel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// Drawing or flushing before initialisation finished
    NotReady,
    /// SPI or pin failure
    Bus,
    /// Framebuffer or scratch smaller than the panel
    BufferTooSmall,
}

/// Initialisation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelState {
    Uninitialized,
    Reset,
    SleepOut,
    ColorModeSet,
    OrientationSet,
    DisplayOn,
    Ready,
}

/// Display rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Portrait
    Deg0,
    /// Landscape (row/column exchange, column mirror)
    #[default]
    Deg90,
    /// Portrait, upside down
    Deg180,
    /// Landscape, flipped
    Deg270,
}

impl Rotation {
    /// Rotation from a quarter-turn count (taken modulo 4)
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns & 3 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    /// MADCTL axis bits for this rotation
    pub const fn madctl(self) -> u8 {
        match self {
            Rotation::Deg0 => 0x00,
            Rotation::Deg90 => 0x60,  // MV | MX
            Rotation::Deg180 => 0xC0, // MY | MX
            Rotation::Deg270 => 0xA0, // MV | MY
        }
    }

    /// Whether rows and columns are exchanged
    pub const fn is_landscape(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Panel geometry and colour order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// Width in the native (portrait) orientation
    pub width: u16,
    /// Height in the native (portrait) orientation
    pub height: u16,
    /// Rotation applied at initialisation
    pub rotation: Rotation,
    /// Panel expects BGR instead of RGB
    pub bgr: bool,
    /// Column offset of the visible area in controller RAM
    pub x_offset: u16,
    /// Row offset of the visible area in controller RAM
    pub y_offset: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: NATIVE_WIDTH,
            height: NATIVE_HEIGHT,
            rotation: Rotation::Deg90,
            bgr: false,
            x_offset: 0,
            y_offset: 0,
        }
    }
}

impl PanelConfig {
    /// Framebuffer bytes needed
    pub const fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }
}

/// One ST7735 behind the demultiplexer
pub struct Panel<'a> {
    address: u8,
    config: PanelConfig,
    rotation: Rotation,
    state: PanelState,
    /// Pixels in little-endian RGB565, row-major in the current rotation
    frame: &'a mut [u8],
    /// Byte-swapped copy sent to the controller
    scratch: &'a mut [u8],
}

impl<'a> Panel<'a> {
    /// Create a panel at demultiplexer `address`
    pub fn new(
        address: u8,
        config: PanelConfig,
        frame: &'a mut [u8],
        scratch: &'a mut [u8],
    ) -> Result<Self, PanelError> {
        let needed = config.frame_bytes();
        if frame.len() < needed || scratch.len() < needed {
            return Err(PanelError::BufferTooSmall);
        }
        Ok(Self {
            address,
            config,
            rotation: config.rotation,
            state: PanelState::Uninitialized,
            frame: &mut frame[..needed],
            scratch: &mut scratch[..needed],
        })
    }

    /// Demultiplexer address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Initialisation progress
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Run the controller initialisation sequence
    ///
    /// On failure the panel stays at the last completed step and the
    /// sequence restarts from the software reset on the next call.
    pub fn init<B: PanelBus>(&mut self, bus: &mut B) -> Result<(), PanelError> {
        let a = self.address;
        self.state = PanelState::Uninitialized;

        bus.command(a, cmd::SWRESET)?;
        bus.delay_ms(SWRESET_DELAY_MS);
        self.state = PanelState::Reset;

        bus.command(a, cmd::SLPOUT)?;
        bus.delay_ms(SLPOUT_DELAY_MS);
        self.state = PanelState::SleepOut;

        bus.command(a, cmd::COLMOD)?;
        bus.data(a, &[COLMOD_16BPP])?;
        self.state = PanelState::ColorModeSet;

        self.write_madctl(bus)?;
        self.state = PanelState::OrientationSet;

        bus.command(a, cmd::INVON)?;
        bus.command(a, cmd::NORON)?;
        bus.command(a, cmd::DISPON)?;
        bus.delay_ms(DISPON_DELAY_MS);
        self.state = PanelState::DisplayOn;

        self.set_full_window(bus)?;
        self.state = PanelState::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("panel {} ready", a);
        Ok(())
    }

    /// Change the rotation
    ///
    /// Before initialisation only the stored rotation changes; afterwards
    /// MADCTL and the window are rewritten. Framebuffer contents are kept
    /// as bytes and should be redrawn.
    pub fn set_rotation<B: PanelBus>(
        &mut self,
        bus: &mut B,
        rotation: Rotation,
    ) -> Result<(), PanelError> {
        self.rotation = rotation;
        if self.state < PanelState::OrientationSet {
            return Ok(());
        }
        self.write_madctl(bus)?;
        self.set_full_window(bus)
    }

    fn write_madctl<B: PanelBus>(&mut self, bus: &mut B) -> Result<(), PanelError> {
        let mut madctl = self.rotation.madctl();
        if self.config.bgr {
            madctl |= MADCTL_BGR;
        }
        bus.command(self.address, cmd::MADCTL)?;
        bus.data(self.address, &[madctl])
    }

    /// Logical (rotated) width and height
    pub fn logical_size(&self) -> (u16, u16) {
        if self.rotation.is_landscape() {
            (self.config.height, self.config.width)
        } else {
            (self.config.width, self.config.height)
        }
    }

    fn set_full_window<B: PanelBus>(&mut self, bus: &mut B) -> Result<(), PanelError> {
        let (w, h) = self.logical_size();
        self.set_window(bus, 0, 0, w - 1, h - 1)
    }

    /// Set the controller's drawing window (inclusive) and open RAM write
    pub fn set_window<B: PanelBus>(
        &mut self,
        bus: &mut B,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), PanelError> {
        let (xs, ys) = if self.rotation.is_landscape() {
            (self.config.y_offset, self.config.x_offset)
        } else {
            (self.config.x_offset, self.config.y_offset)
        };
        let a = self.address;

        bus.command(a, cmd::CASET)?;
        bus.data(a, &window_bytes(x0 + xs, x1 + xs))?;
        bus.command(a, cmd::RASET)?;
        bus.data(a, &window_bytes(y0 + ys, y1 + ys))?;
        bus.command(a, cmd::RAMWR)
    }

    /// Flush the framebuffer to the panel
    ///
    /// Pixels are swapped to big-endian in the scratch buffer and written
    /// in one transfer after the full window is set.
    pub fn show<B: PanelBus>(&mut self, bus: &mut B) -> Result<(), PanelError> {
        self.ensure_ready()?;
        for (dst, src) in self
            .scratch
            .chunks_exact_mut(2)
            .zip(self.frame.chunks_exact(2))
        {
            dst[0] = src[1];
            dst[1] = src[0];
        }
        self.set_full_window(bus)?;
        bus.bulk(self.address, self.scratch)
    }

    /// Raw framebuffer (little-endian RGB565)
    pub fn frame(&self) -> &[u8] {
        self.frame
    }

    /// Colour of one logical pixel
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        let index = self.index(Point::new(i32::from(x), i32::from(y)))?;
        let raw = u16::from_le_bytes([self.frame[index], self.frame[index + 1]]);
        Some(Rgb565::from(RawU16::new(raw)))
    }

    fn ensure_ready(&self) -> Result<(), PanelError> {
        if self.state == PanelState::Ready {
            Ok(())
        } else {
            Err(PanelError::NotReady)
        }
    }

    fn index(&self, p: Point) -> Option<usize> {
        let (w, h) = self.logical_size();
        if p.x < 0 || p.y < 0 || p.x >= i32::from(w) || p.y >= i32::from(h) {
            return None;
        }
        Some((p.y as usize * usize::from(w) + p.x as usize) * 2)
    }
}

fn window_bytes(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}

impl OriginDimensions for Panel<'_> {
    fn size(&self) -> Size {
        let (w, h) = self.logical_size();
        Size::new(u32::from(w), u32::from(h))
    }
}

impl DrawTarget for Panel<'_> {
    type Color = Rgb565;
    type Error = PanelError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.ensure_ready()?;
        for Pixel(point, color) in pixels {
            // Off-panel pixels are clipped
            if let Some(i) = self.index(point) {
                self.frame[i..i + 2].copy_from_slice(&color.into_storage().to_le_bytes());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.ensure_ready()?;
        let area = area.intersection(&self.bounding_box());
        let bytes = color.into_storage().to_le_bytes();
        for p in area.points() {
            if let Some(i) = self.index(p) {
                self.frame[i..i + 2].copy_from_slice(&bytes);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.ensure_ready()?;
        let bytes = color.into_storage().to_le_bytes();
        for px in self.frame.chunks_exact_mut(2) {
            px.copy_from_slice(&bytes);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{Op, RecordingBus};
    use super::*;
    use crate::panel::bus;
    use embedded_graphics::pixelcolor::Rgb565;
    use proptest::prelude::*;

    fn small_config() -> PanelConfig {
        PanelConfig {
            width: 4,
            height: 2,
            rotation: Rotation::Deg0,
            ..PanelConfig::default()
        }
    }

    #[test]
    fn test_init_sequence() {
        let mut frame = [0u8; 16];
        let mut scratch = [0u8; 16];
        let mut panel = Panel::new(3, small_config(), &mut frame, &mut scratch).unwrap();
        let mut bus = RecordingBus::default();

        assert_eq!(panel.state(), PanelState::Uninitialized);
        panel.init(&mut bus).unwrap();
        assert_eq!(panel.state(), PanelState::Ready);

        assert_eq!(
            bus.commands(3),
            [
                cmd::SWRESET,
                cmd::SLPOUT,
                cmd::COLMOD,
                cmd::MADCTL,
                cmd::INVON,
                cmd::NORON,
                cmd::DISPON,
                cmd::CASET,
                cmd::RASET,
                cmd::RAMWR,
            ]
        );
        assert_eq!(bus.ops[1], Op::Delay(150));
        assert!(bus.ops.contains(&Op::Data(3, std::vec![0x05])));
    }

    #[test]
    fn test_draw_before_ready_fails() {
        let mut frame = [0u8; 16];
        let mut scratch = [0u8; 16];
        let mut panel = Panel::new(0, small_config(), &mut frame, &mut scratch).unwrap();
        let mut bus = RecordingBus::default();

        assert_eq!(panel.clear(Rgb565::RED), Err(PanelError::NotReady));
        assert_eq!(panel.show(&mut bus), Err(PanelError::NotReady));
        assert!(bus.ops.is_empty());
    }

    #[test]
    fn test_buffer_too_small() {
        let mut frame = [0u8; 15];
        let mut scratch = [0u8; 16];
        assert!(matches!(
            Panel::new(0, small_config(), &mut frame, &mut scratch),
            Err(PanelError::BufferTooSmall)
        ));
    }

    #[test]
    fn test_madctl_per_rotation() {
        let cases = [
            (Rotation::Deg0, false, 0x00),
            (Rotation::Deg90, false, 0x60),
            (Rotation::Deg180, false, 0xC0),
            (Rotation::Deg270, true, 0xA8),
        ];
        for (rotation, bgr, expected) in cases {
            let mut frame = [0u8; 16];
            let mut scratch = [0u8; 16];
            let config = PanelConfig {
                rotation,
                bgr,
                ..small_config()
            };
            let mut panel = Panel::new(0, config, &mut frame, &mut scratch).unwrap();
            let mut bus = RecordingBus::default();
            panel.init(&mut bus).unwrap();
            assert!(bus.ops.contains(&Op::Data(0, std::vec![expected])));
        }
    }

    #[test]
    fn test_landscape_window_and_size() {
        let mut frame = [0u8; 16];
        let mut scratch = [0u8; 16];
        let config = PanelConfig {
            x_offset: 2,
            y_offset: 1,
            ..small_config()
        };
        let mut panel = Panel::new(0, config, &mut frame, &mut scratch).unwrap();
        let mut bus = RecordingBus::default();
        panel.init(&mut bus).unwrap();
        bus.ops.clear();

        panel.set_rotation(&mut bus, Rotation::Deg90).unwrap();
        assert_eq!(panel.size(), Size::new(2, 4));
        // Columns span the old height, offsets swap
        assert!(bus.ops.contains(&Op::Data(0, std::vec![0, 1, 0, 2])));
        assert!(bus.ops.contains(&Op::Data(0, std::vec![0, 2, 0, 5])));
    }

    #[test]
    fn test_show_swaps_bytes() {
        let mut frame = [0u8; 16];
        let mut scratch = [0u8; 16];
        let mut panel = Panel::new(1, small_config(), &mut frame, &mut scratch).unwrap();
        let mut bus = RecordingBus::default();
        panel.init(&mut bus).unwrap();

        Pixel(Point::new(0, 0), Rgb565::RED).draw(&mut panel).unwrap();
        assert_eq!(&panel.frame()[..2], &[0x00, 0xF8]);

        panel.show(&mut bus).unwrap();
        let bulks = bus.bulks();
        assert_eq!(bulks.len(), 1);
        assert_eq!(bulks[0].0, 1);
        assert_eq!(&bulks[0].1[..2], &[0xF8, 0x00]);
        assert!(matches!(bus.ops.last(), Some(Op::Bulk(1, _))));
    }

    #[test]
    fn test_offscreen_pixels_clipped() {
        let mut frame = [0u8; 16];
        let mut scratch = [0u8; 16];
        let mut panel = Panel::new(0, small_config(), &mut frame, &mut scratch).unwrap();
        panel.init(&mut RecordingBus::default()).unwrap();

        let pixels = [
            Pixel(Point::new(-1, 0), Rgb565::WHITE),
            Pixel(Point::new(4, 0), Rgb565::WHITE),
            Pixel(Point::new(0, 2), Rgb565::WHITE),
        ];
        panel.draw_iter(pixels).unwrap();
        assert!(panel.frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_flush_over_demux_bus_keeps_addresses_apart() {
        let wires = bus::mock::wires(3);
        let mut demux = bus::mock::bus(&wires);

        let mut f0 = [0u8; 16];
        let mut s0 = [0u8; 16];
        let mut f1 = [0u8; 16];
        let mut s1 = [0u8; 16];
        let mut p0 = Panel::new(0b001, small_config(), &mut f0, &mut s0).unwrap();
        let mut p1 = Panel::new(0b010, small_config(), &mut f1, &mut s1).unwrap();
        p0.init(&mut demux).unwrap();
        p1.init(&mut demux).unwrap();
        wires.borrow_mut().transfers.clear();

        p0.show(&mut demux).unwrap();
        p1.show(&mut demux).unwrap();

        let w = wires.borrow();
        let bulk: std::vec::Vec<_> = w.transfers.iter().filter(|t| t.bytes.len() == 16).collect();
        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk[0].select, [true, false, false]);
        assert_eq!(bulk[1].select, [false, true, false]);
        assert!(w
            .transfers
            .iter()
            .take_while(|t| t.bytes.len() != 16)
            .all(|t| t.select == [true, false, false]));
    }

    proptest! {
        #[test]
        fn prop_flush_is_pairwise_swap(data in proptest::collection::vec(any::<u8>(), 16)) {
            let mut frame = [0u8; 16];
            let mut scratch = [0u8; 16];
            let mut panel = Panel::new(0, small_config(), &mut frame, &mut scratch).unwrap();
            let mut bus = RecordingBus::default();
            panel.init(&mut bus).unwrap();
            panel.frame.copy_from_slice(&data);

            panel.show(&mut bus).unwrap();
            let bulks = bus.bulks();
            let sent = bulks[0].1;
            for i in (0..16).step_by(2) {
                prop_assert_eq!(sent[i], data[i + 1]);
                prop_assert_eq!(sent[i + 1], data[i]);
            }
        }
    }
}
