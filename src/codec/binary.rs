use crate::{
    codec::{
        CodecFormat, Decoded, PatternCodec,
        infer::{InferenceHint, infer_dimensions, infer_layout},
        require_frames, warn_dropped_sequence,
    },
    foundation::{
        core::{DEFAULT_FRAME_DURATION_MS, Frame, Rgb},
        error::{CodecError, LmsError, LmsResult},
    },
    instruction::sequence::InstructionSequence,
    pattern::model::PatternMetadata,
};

pub const LEDM_MAGIC: &[u8; 4] = b"LEDM";
/// Version written by the encoder.
pub const LEDM_VERSION: u16 = 1;
/// Newest header version the decoder accepts.
pub const LEDM_MAX_VERSION: u16 = 5;

const HEADER_LEN: usize = 10;
const EXTENSION_LEN: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Layout written by the binary encoder. Decoding detects the layout itself.
pub enum BinaryLayout {
    /// `LEDM` header, per-frame durations.
    #[default]
    Headered,
    /// Bare RGB888 pixels; dimensions and timing are lost.
    Raw,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec {
    layout: BinaryLayout,
}

impl BinaryCodec {
    pub fn new(layout: BinaryLayout) -> Self {
        Self { layout }
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn to_u16(value: usize, what: &str) -> LmsResult<u16> {
    u16::try_from(value).map_err(|_| {
        LmsError::validation(format!("{what} {value} does not fit the binary header (max 65535)"))
    })
}

impl PatternCodec for BinaryCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Binary
    }

    #[tracing::instrument(skip_all, fields(layout = ?self.layout))]
    fn encode(
        &self,
        metadata: &PatternMetadata,
        sequence: Option<&InstructionSequence>,
        frames: Option<&[Frame]>,
    ) -> LmsResult<Vec<u8>> {
        warn_dropped_sequence(CodecFormat::Binary, sequence);
        let frames = require_frames(CodecFormat::Binary, metadata, frames)?;
        match self.layout {
            BinaryLayout::Raw => Ok(frames.iter().flat_map(Frame::to_rgb_bytes).collect()),
            BinaryLayout::Headered => encode_headered(metadata, frames),
        }
    }

    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    fn decode(&self, bytes: &[u8], hint: &InferenceHint) -> LmsResult<Decoded> {
        if bytes.starts_with(LEDM_MAGIC) {
            decode_headered(bytes, hint)
        } else {
            decode_raw(bytes, hint)
        }
    }
}

fn encode_headered(metadata: &PatternMetadata, frames: &[Frame]) -> LmsResult<Vec<u8>> {
    let led_count = metadata.led_count();
    let mut out = Vec::with_capacity(
        HEADER_LEN + EXTENSION_LEN + frames.len() * (2 + 3 * led_count),
    );
    out.extend_from_slice(LEDM_MAGIC);
    out.extend_from_slice(&LEDM_VERSION.to_le_bytes());
    out.extend_from_slice(&to_u16(led_count, "LED count")?.to_le_bytes());
    out.extend_from_slice(&to_u16(frames.len(), "frame count")?.to_le_bytes());
    out.extend_from_slice(&to_u16(metadata.width as usize, "width")?.to_le_bytes());
    out.extend_from_slice(&to_u16(metadata.height as usize, "height")?.to_le_bytes());
    for f in frames {
        out.extend_from_slice(&to_u16(f.duration_ms as usize, "frame duration")?.to_le_bytes());
        out.extend(f.to_rgb_bytes());
    }
    Ok(out)
}

fn decode_headered(bytes: &[u8], hint: &InferenceHint) -> LmsResult<Decoded> {
    if bytes.len() < HEADER_LEN {
        return Err(LmsError::truncated(HEADER_LEN, bytes.len()));
    }
    let version = read_u16(bytes, 4);
    if version == 0 {
        return Err(LmsError::malformed("binary", "header version 0"));
    }
    if version > LEDM_MAX_VERSION {
        return Err(CodecError::UnsupportedVersion {
            format: "binary",
            found: u32::from(version),
            max: u32::from(LEDM_MAX_VERSION),
        }
        .into());
    }
    let led_count = read_u16(bytes, 6) as usize;
    let frame_count = read_u16(bytes, 8) as usize;
    if led_count == 0 {
        return Err(LmsError::malformed("binary", "header declares 0 LEDs"));
    }
    let body = frame_count * (2 + 3 * led_count);

    // The width/height extension is present when it describes the LED count and the
    // payload is not exactly the plain layout.
    let extension = (bytes.len() >= HEADER_LEN + EXTENSION_LEN)
        .then(|| (read_u16(bytes, 10), read_u16(bytes, 12)))
        .filter(|&(w, h)| {
            w > 0 && usize::from(w) * usize::from(h) == led_count && bytes.len() != HEADER_LEN + body
        });

    let (width, height, offset) = match extension {
        Some((w, h)) => (u32::from(w), u32::from(h), HEADER_LEN + EXTENSION_LEN),
        None => {
            let (w, h) = infer_dimensions(led_count, hint)?;
            (w, h, HEADER_LEN)
        }
    };
    let expected = offset + body;
    if bytes.len() < expected {
        return Err(LmsError::truncated(expected, bytes.len()));
    }
    if bytes.len() > expected {
        return Err(LmsError::malformed(
            "binary",
            format!("{} trailing bytes after {frame_count} frames", bytes.len() - expected),
        ));
    }

    let frames = bytes[offset..]
        .chunks_exact(2 + 3 * led_count)
        .map(|chunk| {
            let duration = u32::from(read_u16(chunk, 0));
            let pixels = chunk[2..].chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])).collect();
            Frame::new(pixels, duration)
        })
        .collect::<Vec<_>>();
    tracing::debug!(version, width, height, frames = frames.len(), "decoded LEDM payload");
    Ok(Decoded::frames_only(
        PatternMetadata::without_wiring(width, height, frames.len() as u32),
        frames,
    ))
}

fn decode_raw(bytes: &[u8], hint: &InferenceHint) -> LmsResult<Decoded> {
    let layout = infer_layout(bytes.len(), hint)?;
    let bpp = layout.packing.bytes_per_pixel();
    let frame_bytes = layout.led_count() * bpp;
    let frames = bytes
        .chunks_exact(frame_bytes)
        .map(|chunk| {
            let pixels = chunk
                .chunks_exact(bpp)
                .map(|px| layout.packing.decode(px))
                .collect();
            Frame::new(pixels, DEFAULT_FRAME_DURATION_MS)
        })
        .collect::<Vec<_>>();
    Ok(Decoded::frames_only(
        PatternMetadata::without_wiring(layout.width, layout.height, layout.frame_count),
        frames,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/binary.rs"]
mod tests;
