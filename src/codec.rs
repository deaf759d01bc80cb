pub(crate) mod binary;
pub(crate) mod dat;
pub(crate) mod hex;
pub(crate) mod infer;
pub(crate) mod leds;
pub(crate) mod rows;

use crate::{
    foundation::{
        core::Frame,
        error::{LmsError, LmsResult},
    },
    instruction::sequence::InstructionSequence,
    pattern::model::{Pattern, PatternMetadata, validate_frames},
};

use self::{binary::BinaryCodec, dat::DatCodec, hex::HexCodec, infer::InferenceHint, leds::LedsCodec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// On-disk pattern formats.
pub enum CodecFormat {
    /// Packed binary (`.bin`), headered `LEDM` or raw pixels.
    Binary,
    /// Intel HEX text (`.hex`) wrapping a packed binary payload.
    Hex,
    /// Simple text (`.dat`): dimensions header plus hex pixel rows.
    Dat,
    /// Rich text (`.leds`): metadata, automation queue, optional frames.
    Leds,
}

impl CodecFormat {
    pub const ALL: [Self; 4] = [Self::Binary, Self::Hex, Self::Dat, Self::Leds];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Hex => "hex",
            Self::Dat => "dat",
            Self::Leds => "leds",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Whether the format stores an instruction sequence.
    pub fn carries_sequence(self) -> bool {
        matches!(self, Self::Leds)
    }
}

impl std::str::FromStr for CodecFormat {
    type Err = LmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "binary" => Ok(Self::Binary),
            "ihex" | "intel-hex" => Ok(Self::Hex),
            _ => Self::from_extension(&s)
                .ok_or_else(|| LmsError::validation(format!("unknown format '{s}'"))),
        }
    }
}

impl std::fmt::Display for CodecFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Everything a decode recovered. Fields a format cannot carry are `None`.
pub struct Decoded {
    pub metadata: PatternMetadata,
    pub sequence: Option<InstructionSequence>,
    pub frames: Option<Vec<Frame>>,
    pub name: Option<String>,
}

impl Decoded {
    pub(crate) fn frames_only(metadata: PatternMetadata, frames: Vec<Frame>) -> Self {
        Self {
            metadata,
            sequence: None,
            frames: Some(frames),
            name: None,
        }
    }

    /// Build a validated [`Pattern`], attaching any decoded sequence as its queue.
    pub fn into_pattern(self, fallback_name: &str) -> LmsResult<Pattern> {
        let frames = self.frames.unwrap_or_default();
        if frames.is_empty() && self.metadata.frame_count > 0 {
            return Err(LmsError::validation(format!(
                "metadata declares {} frames but no frame data was decoded",
                self.metadata.frame_count
            )));
        }
        let mut pattern = Pattern::new(
            self.name.unwrap_or_else(|| fallback_name.to_string()),
            self.metadata,
            frames,
        );
        pattern.lms_pattern_instructions = self.sequence;
        pattern.validate()?;
        Ok(pattern)
    }
}

/// A pattern file format. Bytes in, bytes out; callers own file IO.
pub trait PatternCodec {
    fn format(&self) -> CodecFormat;

    /// Serialize. Formats that cannot store `sequence` drop it with a warning;
    /// formats that need frames fail when `frames` is `None`.
    fn encode(
        &self,
        metadata: &PatternMetadata,
        sequence: Option<&InstructionSequence>,
        frames: Option<&[Frame]>,
    ) -> LmsResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8], hint: &InferenceHint) -> LmsResult<Decoded>;
}

pub fn create_codec(format: CodecFormat) -> Box<dyn PatternCodec> {
    create_codec_with(format, &hex::HexOptions::default())
}

/// Like [`create_codec`] with explicit Intel HEX record options.
pub fn create_codec_with(format: CodecFormat, hex: &hex::HexOptions) -> Box<dyn PatternCodec> {
    match format {
        CodecFormat::Binary => Box::new(BinaryCodec::new(hex.layout)),
        CodecFormat::Hex => Box::new(HexCodec::new(hex.clone())),
        CodecFormat::Dat => Box::new(DatCodec),
        CodecFormat::Leds => Box::new(LedsCodec::default()),
    }
}

/// Guess the format from the file extension, then from content.
pub fn detect_format(bytes: &[u8], filename: Option<&str>) -> CodecFormat {
    if let Some(f) = filename
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .and_then(CodecFormat::from_extension)
    {
        return f;
    }
    if bytes.starts_with(binary::LEDM_MAGIC) {
        return CodecFormat::Binary;
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        return CodecFormat::Binary;
    };
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(first) = lines.next() else {
        return CodecFormat::Binary;
    };
    if first.starts_with('#') || first.to_ascii_lowercase().starts_with("pattern") {
        return CodecFormat::Leds;
    }
    if first.starts_with(':') {
        return CodecFormat::Hex;
    }
    let numbers = |l: &str, n: usize| {
        let toks: Vec<&str> = l.split_whitespace().collect();
        toks.len() == n && toks.iter().all(|t| t.parse::<u32>().is_ok())
    };
    if numbers(first, 2) && lines.next().is_some_and(|l| numbers(l, 1)) {
        return CodecFormat::Dat;
    }
    CodecFormat::Binary
}

/// Frames must match the metadata shape and count before any encode.
pub(crate) fn check_frames(metadata: &PatternMetadata, frames: &[Frame]) -> LmsResult<()> {
    validate_frames(metadata, frames)?;
    if metadata.frame_count as usize != frames.len() {
        return Err(LmsError::validation(format!(
            "metadata frame_count {} does not match {} frames",
            metadata.frame_count,
            frames.len()
        )));
    }
    Ok(())
}

pub(crate) fn require_frames<'a>(
    format: CodecFormat,
    metadata: &PatternMetadata,
    frames: Option<&'a [Frame]>,
) -> LmsResult<&'a [Frame]> {
    let frames = frames.ok_or_else(|| {
        LmsError::validation(format!("{format} format requires frame data"))
    })?;
    check_frames(metadata, frames)?;
    Ok(frames)
}

pub(crate) fn warn_dropped_sequence(format: CodecFormat, sequence: Option<&InstructionSequence>) {
    if let Some(s) = sequence.filter(|s| !s.is_empty()) {
        tracing::warn!(
            %format,
            instructions = s.len(),
            "format cannot store an instruction sequence; dropping it"
        );
    }
}

#[cfg(test)]
#[path = "../tests/unit/codec/registry.rs"]
mod tests;
