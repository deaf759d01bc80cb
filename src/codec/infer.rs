use crate::foundation::{
    core::Rgb,
    error::{CodecError, LmsError, LmsResult},
};

/// LED counts of commonly sold strips and panels, used to split headerless payloads.
pub const COMMON_LED_COUNTS: [usize; 19] = [
    64, 72, 76, 96, 100, 120, 144, 150, 160, 192, 256, 300, 320, 400, 512, 600, 800, 1024, 2048,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Expected matrix shape, e.g. the last layout the user confirmed.
pub struct Aspect {
    pub width: u32,
    pub height: u32,
}

impl Aspect {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn led_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::str::FromStr for Aspect {
    type Err = LmsError;

    /// Parse `WxH` (also accepts `X` and `*`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X', '*'])
            .ok_or_else(|| LmsError::validation(format!("aspect '{s}' must be WxH")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| LmsError::validation(format!("aspect '{s}' must be WxH with W,H > 0")))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Pixel encoding of a headerless payload.
pub enum PixelPacking {
    Rgb888,
    /// Little-endian 5-6-5.
    Rgb565,
    /// One grey byte per pixel.
    Mono8,
}

impl PixelPacking {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb888 => 3,
            Self::Rgb565 => 2,
            Self::Mono8 => 1,
        }
    }

    /// Decode one pixel from exactly `bytes_per_pixel` bytes.
    pub(crate) fn decode(self, b: &[u8]) -> Rgb {
        match self {
            Self::Rgb888 => Rgb::new(b[0], b[1], b[2]),
            Self::Rgb565 => {
                let v = u16::from_le_bytes([b[0], b[1]]);
                let r = ((v >> 11) & 0x1F) as u8;
                let g = ((v >> 5) & 0x3F) as u8;
                let bl = (v & 0x1F) as u8;
                Rgb::new((r << 3) | (r >> 2), (g << 2) | (g >> 4), (bl << 3) | (bl >> 2))
            }
            Self::Mono8 => Rgb::grey(b[0]),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Caller-supplied knowledge used when a format does not carry its own layout.
///
/// Passed explicitly on every decode; nothing is remembered between calls.
pub struct InferenceHint {
    pub aspect: Option<Aspect>,
    /// Preferred matrix width, used when it divides the LED count.
    pub width: Option<u32>,
    pub led_count: Option<u32>,
    pub frame_count: Option<u32>,
    pub packing: Option<PixelPacking>,
}

impl InferenceHint {
    pub fn with_aspect(mut self, width: u32, height: u32) -> Self {
        self.aspect = Some(Aspect::new(width, height));
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_led_count(mut self, led_count: u32) -> Self {
        self.led_count = Some(led_count);
        self
    }

    pub fn with_frame_count(mut self, frame_count: u32) -> Self {
        self.frame_count = Some(frame_count);
        self
    }

    pub fn with_packing(mut self, packing: PixelPacking) -> Self {
        self.packing = Some(packing);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InferredLayout {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub packing: PixelPacking,
}

impl InferredLayout {
    pub fn led_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn ambiguous(msg: impl Into<String>) -> LmsError {
    CodecError::AmbiguousDimensions(msg.into()).into()
}

/// Packing for a payload of `byte_len` bytes: the hint, else RGB888 when the length
/// divides by 3, else one grey byte per pixel.
pub fn choose_packing(byte_len: usize, hint: &InferenceHint) -> PixelPacking {
    hint.packing.unwrap_or(if byte_len % 3 == 0 {
        PixelPacking::Rgb888
    } else {
        PixelPacking::Mono8
    })
}

/// Work out dimensions and frame count of a headerless payload. Deterministic: the
/// same bytes length and hint always produce the same layout.
pub fn infer_layout(byte_len: usize, hint: &InferenceHint) -> LmsResult<InferredLayout> {
    let packing = choose_packing(byte_len, hint);
    let bpp = packing.bytes_per_pixel();
    if byte_len % bpp != 0 {
        return Err(LmsError::truncated(byte_len.div_ceil(bpp) * bpp, byte_len));
    }
    let pixels = byte_len / bpp;
    if pixels == 0 {
        return Err(LmsError::malformed("binary", "payload carries no pixels"));
    }

    let led_count = infer_led_count(pixels, bpp, hint)?;
    let (width, height) = infer_dimensions(led_count, hint)?;
    let frame_count = u32::try_from(pixels / led_count)
        .map_err(|_| ambiguous(format!("{} frames exceeds u32", pixels / led_count)))?;
    tracing::debug!(
        byte_len,
        ?packing,
        width,
        height,
        frame_count,
        "inferred raw payload layout"
    );
    Ok(InferredLayout {
        width,
        height,
        frame_count,
        packing,
    })
}

/// LEDs per frame for `pixels` total pixels.
pub fn infer_led_count(pixels: usize, bpp: usize, hint: &InferenceHint) -> LmsResult<usize> {
    let aspect_leds = hint.aspect.map(Aspect::led_count);
    if aspect_leds == Some(0) {
        return Err(ambiguous("aspect hint has a zero dimension"));
    }

    if let Some(n) = hint.led_count {
        let n = n as usize;
        if n == 0 {
            return Err(ambiguous("led_count hint must be > 0"));
        }
        if let Some(a) = aspect_leds
            && a != n
        {
            return Err(ambiguous(format!(
                "aspect hint ({a} LEDs) contradicts led_count hint {n}"
            )));
        }
        if pixels % n != 0 {
            return Err(LmsError::truncated(pixels.div_ceil(n) * n * bpp, pixels * bpp));
        }
        if let Some(fc) = hint.frame_count
            && fc as usize * n != pixels
        {
            return Err(ambiguous(format!(
                "{pixels} pixels cannot hold {fc} frames of {n} LEDs"
            )));
        }
        return Ok(n);
    }

    if let Some(fc) = hint.frame_count {
        let fc = fc as usize;
        if fc == 0 || pixels % fc != 0 {
            return Err(ambiguous(format!(
                "{pixels} pixels do not split into {fc} frames"
            )));
        }
        let n = pixels / fc;
        if let Some(a) = aspect_leds
            && a != n
        {
            return Err(ambiguous(format!(
                "aspect hint ({a} LEDs) contradicts {fc} frames of {n} LEDs"
            )));
        }
        return Ok(n);
    }

    if let Some(a) = aspect_leds
        && pixels % a == 0
    {
        return Ok(a);
    }

    if let Some(n) = best_common_led_count(pixels) {
        tracing::debug!(pixels, led_count = n, "matched common LED count");
        return Ok(n);
    }
    Ok(pixels)
}

fn frames_score(frames: usize) -> u8 {
    match frames {
        10..=240 => 3,
        5..=480 => 2,
        _ => 1,
    }
}

/// Best common LED count giving at least two whole frames; ties prefer more frames.
fn best_common_led_count(pixels: usize) -> Option<usize> {
    COMMON_LED_COUNTS
        .iter()
        .copied()
        .filter(|n| pixels % n == 0 && pixels / n >= 2)
        .max_by_key(|n| (frames_score(pixels / n), pixels / n))
}

fn factor_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            pairs.push((d, n / d));
            if d != n / d {
                pairs.push((n / d, d));
            }
        }
        d += 1;
    }
    pairs
}

/// Choose `(width, height)` for `led_count` LEDs.
pub fn infer_dimensions(led_count: usize, hint: &InferenceHint) -> LmsResult<(u32, u32)> {
    if led_count == 0 {
        return Err(ambiguous("LED count must be > 0"));
    }
    let to_u32 = |(w, h): (usize, usize)| -> LmsResult<(u32, u32)> {
        Ok((
            u32::try_from(w).map_err(|_| ambiguous("width exceeds u32"))?,
            u32::try_from(h).map_err(|_| ambiguous("height exceeds u32"))?,
        ))
    };

    if let Some(a) = hint.aspect
        && a.led_count() == led_count
    {
        return Ok((a.width, a.height));
    }
    if let Some(w) = hint.width.map(|w| w as usize)
        && w > 0
        && led_count % w == 0
    {
        return to_u32((w, led_count / w));
    }

    let pairs = factor_pairs(led_count);
    let perimeter = |(w, h): (usize, usize)| w + h;

    let chosen = match hint.aspect.filter(|a| a.width > 0 && a.height > 0) {
        Some(a) => {
            let (aw, ah) = (a.width as u128, a.height as u128);
            // |w/h - aw/ah| compared by cross-multiplication: |w*ah - aw*h| / (h*ah).
            let key = |(w, h): (usize, usize)| {
                let (w, h) = (w as u128, h as u128);
                ((w * ah).abs_diff(aw * h), h)
            };
            pairs.iter().copied().min_by(|&p, &q| {
                let (dp, hp) = key(p);
                let (dq, hq) = key(q);
                (dp * hq)
                    .cmp(&(dq * hp))
                    .then(perimeter(p).cmp(&perimeter(q)))
                    .then(q.0.cmp(&p.0))
            })
        }
        None => pairs
            .iter()
            .copied()
            .min_by(|&p, &q| perimeter(p).cmp(&perimeter(q)).then(q.0.cmp(&p.0))),
    };
    let (w, h) = chosen.unwrap_or((led_count, 1));
    tracing::debug!(led_count, width = w, height = h, "factored LED count");
    to_u32((w, h))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/infer.rs"]
mod tests;
