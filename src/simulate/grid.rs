use crate::foundation::{
    core::Rgb,
    math::{lerp_u8, mul_div255_u8},
};

/// Borrowed view of a row-major `width x height` pixel buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GridShape {
    pub width: usize,
    pub height: usize,
}

impl GridShape {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as usize,
            height: height as usize,
        }
    }

    #[inline]
    fn idx(self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// Circular shift by `dx` columns and `dy` rows (positive = right/down).
pub(crate) fn shift_wrap(shape: GridShape, src: &[Rgb], dx: isize, dy: isize) -> Vec<Rgb> {
    let (w, h) = (shape.width as isize, shape.height as isize);
    let mut out = vec![Rgb::BLACK; src.len()];
    for y in 0..h {
        for x in 0..w {
            let sx = (x - dx).rem_euclid(w);
            let sy = (y - dy).rem_euclid(h);
            out[shape.idx(x as usize, y as usize)] = src[shape.idx(sx as usize, sy as usize)];
        }
    }
    out
}

/// Rotate clockwise by `turns` quarter turns about the grid centre.
///
/// The canvas keeps its shape; on non-square grids pixels rotated outside are
/// cropped and uncovered pixels are black.
pub(crate) fn rotate_quarter(shape: GridShape, src: &[Rgb], turns: u8) -> Vec<Rgb> {
    let turns = turns % 4;
    if turns == 0 {
        return src.to_vec();
    }
    let (w, h) = (shape.width as i64, shape.height as i64);
    let mut out = vec![Rgb::BLACK; src.len()];
    for y in 0..h {
        for x in 0..w {
            // Doubled coordinates relative to the centre keep half-pixel centres exact.
            let dx2 = 2 * x - (w - 1);
            let dy2 = 2 * y - (h - 1);
            let (sx2, sy2) = match turns {
                1 => (dy2, -dx2),
                2 => (-dx2, -dy2),
                _ => (-dy2, dx2),
            };
            let sx = (sx2 + (w - 1)).div_euclid(2);
            let sy = (sy2 + (h - 1)).div_euclid(2);
            if (0..w).contains(&sx) && (0..h).contains(&sy) {
                out[shape.idx(x as usize, y as usize)] = src[shape.idx(sx as usize, sy as usize)];
            }
        }
    }
    out
}

/// Reflect left <-> right.
pub(crate) fn mirror_h(shape: GridShape, src: &[Rgb]) -> Vec<Rgb> {
    let mut out = src.to_vec();
    for row in out.chunks_exact_mut(shape.width) {
        row.reverse();
    }
    out
}

/// Reflect top <-> bottom.
pub(crate) fn mirror_v(shape: GridShape, src: &[Rgb]) -> Vec<Rgb> {
    src.chunks_exact(shape.width)
        .rev()
        .flatten()
        .copied()
        .collect()
}

pub(crate) fn invert(src: &[Rgb]) -> Vec<Rgb> {
    src.iter().map(|p| p.inverted()).collect()
}

/// Scale every channel by `(100 + delta) / 100`, clamped to `0..=255`.
pub(crate) fn scale_brightness(src: &[Rgb], delta: i16) -> Vec<Rgb> {
    let factor = (100 + i32::from(delta)).max(0);
    src.iter()
        .map(|p| p.map(|c| ((i32::from(c) * factor + 50) / 100).clamp(0, 255) as u8))
        .collect()
}

/// Per-pixel blend `a -> b` by `t/255`.
pub(crate) fn blend(a: &[Rgb], b: &[Rgb], t: u8) -> Vec<Rgb> {
    a.iter()
        .zip(b)
        .map(|(pa, pb)| {
            Rgb::new(
                lerp_u8(pa.r, pb.r, t),
                lerp_u8(pa.g, pb.g, t),
                lerp_u8(pa.b, pb.b, t),
            )
        })
        .collect()
}

/// Scale every channel toward black by `t/255`.
pub(crate) fn darken(src: &[Rgb], t: u8) -> Vec<Rgb> {
    let keep = 255 - u16::from(t);
    src.iter()
        .map(|p| p.map(|c| mul_div255_u8(u16::from(c), keep)))
        .collect()
}

/// Keep `after` where the mask is lit and `before` elsewhere.
pub(crate) fn apply_mask(before: &[Rgb], after: Vec<Rgb>, mask: &[Rgb]) -> Vec<Rgb> {
    after
        .into_iter()
        .zip(before.iter().zip(mask))
        .map(|(a, (b, m))| if m.is_black() { *b } else { a })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/simulate/grid.rs"]
mod tests;
