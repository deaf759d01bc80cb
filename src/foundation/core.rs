use crate::foundation::error::{LmsError, LmsResult};

/// Display duration used when a format carries no per-frame timing (50 FPS).
pub const DEFAULT_FRAME_DURATION_MS: u32 = 20;

/// One LED colour in logical RGB order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(v: u8) -> Self {
        Self::new(v, v, v)
    }

    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }

    pub fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    pub fn map(self, mut f: impl FnMut(u8) -> u8) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Parse `RRGGBB`, with or without a `0x`/`#` prefix.
    pub fn from_hex(token: &str) -> LmsResult<Self> {
        let digits = token
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X")
            .trim_start_matches('#');
        if digits.len() != 6 {
            return Err(LmsError::validation(format!(
                "pixel '{token}' must be 6 hex digits"
            )));
        }
        let v = u32::from_str_radix(digits, 16)
            .map_err(|_| LmsError::validation(format!("pixel '{token}' is not hex")))?;
        Ok(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// A single animation frame: row-major pixels plus how long it is shown.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub pixels: Vec<Rgb>,
    pub duration_ms: u32,
}

impl Frame {
    pub fn new(pixels: Vec<Rgb>, duration_ms: u32) -> Self {
        Self {
            pixels,
            duration_ms,
        }
    }

    pub fn solid(led_count: usize, color: Rgb, duration_ms: u32) -> Self {
        Self::new(vec![color; led_count], duration_ms)
    }

    pub fn led_count(&self) -> usize {
        self.pixels.len()
    }

    /// Packed RGB bytes in pixel order.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
