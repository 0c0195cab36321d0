//! Shared SPI bus behind a select-line demultiplexer
//!
//! Panels are addressed by driving a set of select lines into a 74HC138
//! style demultiplexer whose outputs feed the panels' chip-select inputs.
//! The demultiplexer latches nothing, so the address is driven again
//! before every command byte, every data byte and every bulk transfer.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::st7735::PanelError;

/// Settling time after the select lines change
pub const SELECT_SETTLE_US: u32 = 3;

/// Byte-level access to one addressed panel
pub trait PanelBus {
    /// Send a command byte (DC low)
    fn command(&mut self, address: u8, command: u8) -> Result<(), PanelError>;

    /// Send parameter bytes (DC high), one addressed transfer per byte
    fn data(&mut self, address: u8, data: &[u8]) -> Result<(), PanelError>;

    /// Send pixel data (DC high) as one addressed transfer
    fn bulk(&mut self, address: u8, data: &[u8]) -> Result<(), PanelError>;

    /// Blocking sleep
    fn delay_ms(&mut self, ms: u32);
}

/// SPI bus, DC line and `L` select lines shared by all panels
pub struct DemuxBus<SPI, DC, A, D, const L: usize> {
    spi: SPI,
    dc: DC,
    lines: [A; L],
    delay: D,
}

impl<SPI, DC, A, D, const L: usize> DemuxBus<SPI, DC, A, D, L>
where
    SPI: SpiBus,
    DC: OutputPin,
    A: OutputPin,
    D: DelayNs,
{
    /// Create the bus; select line `i` carries address bit `i`
    pub fn new(spi: SPI, dc: DC, lines: [A; L], delay: D) -> Self {
        Self {
            spi,
            dc,
            lines,
            delay,
        }
    }

    /// Number of addressable panels
    pub const fn capacity() -> usize {
        1 << L
    }

    /// Drive every select line to route the bus to `address`
    pub fn select(&mut self, address: u8) -> Result<(), PanelError> {
        for (bit, line) in self.lines.iter_mut().enumerate() {
            let high = address & (1 << bit) != 0;
            if high {
                line.set_high().map_err(|_| PanelError::Bus)?;
            } else {
                line.set_low().map_err(|_| PanelError::Bus)?;
            }
        }
        self.delay.delay_us(SELECT_SETTLE_US);
        Ok(())
    }

    fn transfer(&mut self, address: u8, is_data: bool, bytes: &[u8]) -> Result<(), PanelError> {
        self.select(address)?;
        if is_data {
            self.dc.set_high().map_err(|_| PanelError::Bus)?;
        } else {
            self.dc.set_low().map_err(|_| PanelError::Bus)?;
        }
        self.spi.write(bytes).map_err(|_| PanelError::Bus)?;
        // DC must not change while bits are still shifting out
        self.spi.flush().map_err(|_| PanelError::Bus)
    }

    /// Release the bus parts
    pub fn release(self) -> (SPI, DC, [A; L], D) {
        (self.spi, self.dc, self.lines, self.delay)
    }
}

impl<SPI, DC, A, D, const L: usize> PanelBus for DemuxBus<SPI, DC, A, D, L>
where
    SPI: SpiBus,
    DC: OutputPin,
    A: OutputPin,
    D: DelayNs,
{
    fn command(&mut self, address: u8, command: u8) -> Result<(), PanelError> {
        self.transfer(address, false, &[command])
    }

    fn data(&mut self, address: u8, data: &[u8]) -> Result<(), PanelError> {
        for &byte in data {
            self.transfer(address, true, &[byte])?;
        }
        Ok(())
    }

    fn bulk(&mut self, address: u8, data: &[u8]) -> Result<(), PanelError> {
        self.transfer(address, true, data)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
