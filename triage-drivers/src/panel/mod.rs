//! ST7735 panels multiplexed on one SPI bus
//!
//! - [`bus`]: select-line demultiplexer and the byte-level [`PanelBus`]
//! - [`st7735`]: controller init, windowing and a framebuffer draw target
//! - [`bmp`]: 24-bit BMP decoding for the logo
//! - [`text`]: integer-scaled drawing for the route badge
//! - [`bank`]: the [`SlotDisplay`](triage_core::traits::SlotDisplay) implementation

pub mod bank;
pub mod bmp;
pub mod bus;
pub mod st7735;
pub mod text;

pub use bank::PanelBank;
pub use bmp::{Bmp24, BmpError};
pub use bus::{DemuxBus, PanelBus};
pub use st7735::{Panel, PanelConfig, PanelError, PanelState, Rotation};
pub use text::Scaled;
