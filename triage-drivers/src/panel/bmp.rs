//! 24-bit uncompressed BMP decoding
//!
//! Only what the panel logo needs: `BM` files with a BITMAPINFOHEADER (or
//! larger), 24 bits per pixel, no compression. Rows are padded to four
//! bytes and stored bottom-up unless the height is negative.

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;

const FILE_HEADER_SIZE: usize = 14;
const MIN_DIB_SIZE: u32 = 40;

/// Bitmap decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BmpError {
    /// File does not start with `BM`
    BadMagic,
    /// DIB header older than BITMAPINFOHEADER, zero width, or a width too
    /// large to address
    UnsupportedHeader,
    /// Not 24 bits per pixel, or compressed
    UnsupportedFormat,
    /// File ends before the header or pixel data does
    Truncated,
}

/// A validated 24-bit bitmap borrowed from its file bytes
#[derive(Debug, Clone, Copy)]
pub struct Bmp24<'a> {
    data: &'a [u8],
    pixel_offset: usize,
    stride: usize,
    width: u32,
    height: u32,
    top_down: bool,
}

impl<'a> Bmp24<'a> {
    /// Validate the headers of `data`
    pub fn parse(data: &'a [u8]) -> Result<Self, BmpError> {
        if data.len() < 2 || &data[..2] != b"BM" {
            return Err(BmpError::BadMagic);
        }
        if data.len() < FILE_HEADER_SIZE + MIN_DIB_SIZE as usize {
            return Err(BmpError::Truncated);
        }

        let pixel_offset = read_u32(data, 10);
        let dib_size = read_u32(data, 14);
        if dib_size < MIN_DIB_SIZE {
            return Err(BmpError::UnsupportedHeader);
        }

        let width = read_u32(data, 18) as i32;
        let height = read_u32(data, 22) as i32;
        let bpp = u16::from_le_bytes([data[28], data[29]]);
        let compression = read_u32(data, 30);
        if bpp != 24 || compression != 0 {
            return Err(BmpError::UnsupportedFormat);
        }
        if width <= 0 {
            return Err(BmpError::UnsupportedHeader);
        }

        let width = width as u32;
        let rows = height.unsigned_abs();

        // Sizes stay in u32 so a hostile header cannot wrap on 32-bit targets
        let stride = width
            .checked_mul(3)
            .and_then(|n| n.checked_add(3))
            .map(|n| n / 4 * 4)
            .ok_or(BmpError::UnsupportedHeader)?;
        let end = stride
            .checked_mul(rows)
            .and_then(|n| n.checked_add(pixel_offset))
            .ok_or(BmpError::Truncated)?;
        if data.len() < end as usize {
            return Err(BmpError::Truncated);
        }

        Ok(Self {
            data,
            pixel_offset: pixel_offset as usize,
            stride: stride as usize,
            width,
            height: rows,
            top_down: height < 0,
        })
    }

    /// Image size in pixels
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether rows are stored top row first
    pub fn is_top_down(&self) -> bool {
        self.top_down
    }

    /// Bytes per stored row, padded to a multiple of four
    pub fn row_stride(&self) -> usize {
        self.stride
    }

    /// Colour at image coordinates (top-left origin)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let stored_row = if self.top_down {
            y
        } else {
            self.height - 1 - y
        };
        let i = self.pixel_offset + stored_row as usize * self.row_stride() + x as usize * 3;
        // Stored as B, G, R
        Some(Rgb888::new(self.data[i + 2], self.data[i + 1], self.data[i]))
    }

    /// All pixels in image coordinates, row by row
    pub fn pixels(&self) -> impl Iterator<Item = (Point, Rgb888)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                self.pixel(x, y)
                    .map(|c| (Point::new(x as i32, y as i32), c))
            })
        })
    }

    /// Draw at `origin`, skipping pixels equal to `color_key`
    ///
    /// Pixels that fall outside the target are clipped by the target.
    pub fn draw<D>(&self, target: &mut D, origin: Point, color_key: Option<Rgb888>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let pixels = self
            .pixels()
            .filter(|(_, c)| Some(*c) != color_key)
            .map(|(p, c)| Pixel(origin + p, to_rgb565(c)));
        target.draw_iter(pixels)
    }
}

/// Truncating RGB888 → RGB565 conversion
pub fn to_rgb565(c: Rgb888) -> Rgb565 {
    Rgb565::new(c.r() >> 3, c.g() >> 2, c.b() >> 3)
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::vec::Vec;

    /// Build a 24-bit BMP; `rows` are top row first, pixels as (r, g, b)
    pub fn bmp24(width: u32, rows: &[&[(u8, u8, u8)]], top_down: bool) -> Vec<u8> {
        let height = rows.len() as u32;
        let stride = (width as usize * 3).div_ceil(4) * 4;
        let pixel_offset = 54u32;
        let size = pixel_offset as usize + stride * height as usize;

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(size as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&pixel_offset.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        let stored_height = if top_down { -(height as i32) } else { height as i32 };
        out.extend_from_slice(&stored_height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&[0; 24]);

        let ordered: Vec<&&[(u8, u8, u8)]> = if top_down {
            rows.iter().collect()
        } else {
            rows.iter().rev().collect()
        };
        for row in ordered {
            let start = out.len();
            for &(r, g, b) in row.iter() {
                out.extend_from_slice(&[b, g, r]);
            }
            out.resize(start + stride, 0);
        }
        out
    }
}
