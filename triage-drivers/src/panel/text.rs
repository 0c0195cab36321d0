//! Integer-scaled drawing
//!
//! The route badge is drawn with a small mono font blown up by a whole
//! factor. [`Scaled`] turns every logical pixel into a `scale` x `scale`
//! block on the wrapped target.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Draw target that magnifies everything drawn through it
pub struct Scaled<'d, D> {
    inner: &'d mut D,
    scale: u32,
    origin: Point,
}

impl<'d, D: DrawTarget> Scaled<'d, D> {
    /// Wrap `inner`; logical (0, 0) maps to `origin` on the inner target
    pub fn new(inner: &'d mut D, scale: u32, origin: Point) -> Self {
        Self {
            inner,
            scale: scale.max(1),
            origin,
        }
    }

    fn block(&self, p: Point) -> Rectangle {
        Rectangle::new(
            self.origin + p * self.scale as i32,
            Size::new_equal(self.scale),
        )
    }
}

impl<D: DrawTarget> Dimensions for Scaled<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        let outer = self.inner.bounding_box();
        let s = self.scale as i32;
        Rectangle::new(
            (outer.top_left - self.origin) / s,
            outer.size / self.scale,
        )
    }
}

impl<D: DrawTarget> DrawTarget for Scaled<'_, D> {
    type Color = D::Color;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            let block = self.block(p);
            self.inner.fill_solid(&block, color)?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let scaled = Rectangle::new(
            self.origin + area.top_left * self.scale as i32,
            area.size * self.scale,
        );
        self.inner.fill_solid(&scaled, color)
    }
}
