use std::convert::Infallible;

use embedded_graphics::{
    Drawable, Pixel,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X10},
    },
    pixelcolor::{Rgb888, RgbColor},
    prelude::{DrawTarget, OriginDimensions, Point, Size},
    text::{Baseline, Text},
};

use crate::{foundation::core::Rgb, simulate::grid::GridShape};

/// Largest first; the first font that fits the grid height wins.
const FONTS: [&MonoFont<'static>; 4] = [&FONT_6X10, &FONT_5X8, &FONT_5X7, &FONT_4X6];

pub(crate) fn pick_font(height: usize) -> &'static MonoFont<'static> {
    FONTS
        .iter()
        .copied()
        .find(|f| f.character_size.height as usize <= height)
        .unwrap_or(FONTS[FONTS.len() - 1])
}

/// Rendered width of `text` in pixels.
pub(crate) fn text_width(font: &MonoFont<'_>, text: &str) -> usize {
    let n = text.chars().count();
    if n == 0 {
        return 0;
    }
    let cw = font.character_size.width as usize;
    let spacing = font.character_spacing as usize;
    n * cw + (n - 1) * spacing
}

/// Pixel buffer adapter so embedded-graphics can draw straight into a frame.
struct GridTarget<'a> {
    shape: GridShape,
    pixels: &'a mut [Rgb],
}

impl OriginDimensions for GridTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.shape.width as u32, self.shape.height as u32)
    }
}

impl DrawTarget for GridTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = (self.shape.width as i32, self.shape.height as i32);
        for Pixel(p, color) in pixels {
            if (0..w).contains(&p.x) && (0..h).contains(&p.y) {
                let i = p.y as usize * self.shape.width + p.x as usize;
                self.pixels[i] = Rgb::new(color.r(), color.g(), color.b());
            }
        }
        Ok(())
    }
}

/// Draw `text` over `pixels` with its left edge at column `x`, vertically centred.
///
/// Only lit glyph pixels are written; the background shows through.
pub(crate) fn draw_text(shape: GridShape, pixels: &mut [Rgb], text: &str, x: i32, color: Rgb) {
    let font = pick_font(shape.height);
    let right = i64::from(x) + text_width(font, text) as i64;
    if i64::from(x) >= shape.width as i64 || right <= 0 {
        return;
    }
    let y = (shape.height as i32 - font.character_size.height as i32) / 2;
    let style = MonoTextStyle::new(font, Rgb888::new(color.r, color.g, color.b));
    let mut target = GridTarget { shape, pixels };
    let Ok(_) = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut target);
}

/// Left edge of the banner at 0-based `step` when scrolling right to left by `speed`.
pub(crate) fn scroll_offset(width: usize, speed: u32, step: u32) -> i32 {
    let travelled = i64::from(speed) * (i64::from(step) + 1);
    (width as i64 - travelled).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/simulate/text.rs"]
mod tests;
