use crate::{
    foundation::core::Frame,
    foundation::error::{LmsError, LmsResult},
    instruction::sequence::InstructionSequence,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// An LED animation: layout metadata, frame buffers, and the attached automation queue.
///
/// Frames are the authoritative pixel data. The preview simulator and codecs read them
/// by reference; only [`crate::finalize`] and [`crate::PreviewOverlay::apply`] write.
pub struct Pattern {
    /// Display name.
    pub name: String,
    /// Layout and wiring.
    pub metadata: PatternMetadata,
    /// Ordered frame buffers.
    pub frames: Vec<Frame>,
    /// Finalized automation queue, exported with the pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lms_pattern_instructions: Option<InstructionSequence>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Layout metadata shared by every codec.
pub struct PatternMetadata {
    /// LEDs per row (or total LEDs for a strip).
    pub width: u32,
    /// Rows (1 for a strip).
    pub height: u32,
    /// Number of frames.
    pub frame_count: u32,
    /// Channel order the hardware expects.
    #[serde(default)]
    pub color_order: ColorOrder,
    /// Physical wiring; `Unknown` when the source format cannot say.
    #[serde(default)]
    pub wiring: WiringMode,
    /// Corner where the data line enters; `Unknown` when the source format cannot say.
    #[serde(default)]
    pub data_in_corner: DataInCorner,
}

impl PatternMetadata {
    /// Metadata with wiring and orientation left `Unknown` and RGB channel order.
    pub fn without_wiring(width: u32, height: u32, frame_count: u32) -> Self {
        Self {
            width,
            height,
            frame_count,
            color_order: ColorOrder::Rgb,
            wiring: WiringMode::Unknown,
            data_in_corner: DataInCorner::Unknown,
        }
    }

    /// Drop the fields legacy formats cannot carry.
    pub fn strip_wiring(&self) -> Self {
        Self::without_wiring(self.width, self.height, self.frame_count)
    }

    pub fn led_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn is_matrix(&self) -> bool {
        self.height > 1
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Channel order used when the firmware shifts bytes out.
pub enum ColorOrder {
    #[default]
    Rgb,
    Grb,
    Brg,
    Bgr,
    Rbg,
    Gbr,
}

impl ColorOrder {
    pub const ALL: [Self; 6] = [
        Self::Rgb,
        Self::Grb,
        Self::Brg,
        Self::Bgr,
        Self::Rbg,
        Self::Gbr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Grb => "GRB",
            Self::Brg => "BRG",
            Self::Bgr => "BGR",
            Self::Rbg => "RBG",
            Self::Gbr => "GBR",
        }
    }

    pub fn parse(s: &str) -> LmsResult<Self> {
        let s = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| LmsError::validation(format!("unknown color order '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// How LEDs are chained across the matrix.
pub enum WiringMode {
    RowMajor,
    Serpentine,
    ColumnMajor,
    ColumnSerpentine,
    #[default]
    Unknown,
}

impl WiringMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RowMajor => "Row-major",
            Self::Serpentine => "Serpentine",
            Self::ColumnMajor => "Column-major",
            Self::ColumnSerpentine => "Column-serpentine",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> LmsResult<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "row-major" | "rowmajor" => Ok(Self::RowMajor),
            "serpentine" => Ok(Self::Serpentine),
            "column-major" | "columnmajor" => Ok(Self::ColumnMajor),
            "column-serpentine" | "columnserpentine" => Ok(Self::ColumnSerpentine),
            "unknown" => Ok(Self::Unknown),
            other => Err(LmsError::validation(format!(
                "unknown wiring mode '{other}'"
            ))),
        }
    }

    /// Legacy `Serpentine:` flag; `None` when the wiring is not known.
    pub fn serpentine_flag(self) -> Option<bool> {
        match self {
            Self::Serpentine | Self::ColumnSerpentine => Some(true),
            Self::RowMajor | Self::ColumnMajor => Some(false),
            Self::Unknown => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Corner of the panel where the data line enters.
pub enum DataInCorner {
    LeftTop,
    LeftBottom,
    RightTop,
    RightBottom,
    #[default]
    Unknown,
}

impl DataInCorner {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftTop => "LT",
            Self::LeftBottom => "LB",
            Self::RightTop => "RT",
            Self::RightBottom => "RB",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> LmsResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LT" => Ok(Self::LeftTop),
            "LB" => Ok(Self::LeftBottom),
            "RT" => Ok(Self::RightTop),
            "RB" => Ok(Self::RightBottom),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(LmsError::validation(format!(
                "unknown data-in corner '{other}'"
            ))),
        }
    }

    /// Legacy `Orientation:` value written next to the corner.
    pub fn legacy_orientation(self) -> &'static str {
        match self {
            Self::LeftTop => "RowLeftToRight",
            Self::RightTop => "RowRightToLeft",
            Self::LeftBottom => "RowLeftToRightBottomUp",
            Self::RightBottom => "RowRightToLeftBottomUp",
            Self::Unknown => "Unknown",
        }
    }

    /// Inverse of [`DataInCorner::legacy_orientation`]; unrecognised values are `Unknown`.
    pub fn from_legacy_orientation(s: &str) -> Self {
        match s.trim() {
            "RowLeftToRight" => Self::LeftTop,
            "RowRightToLeft" => Self::RightTop,
            "RowLeftToRightBottomUp" => Self::LeftBottom,
            "RowRightToLeftBottomUp" => Self::RightBottom,
            _ => Self::Unknown,
        }
    }
}

impl Pattern {
    /// Build a pattern whose `frame_count` matches `frames`.
    pub fn new(name: impl Into<String>, mut metadata: PatternMetadata, frames: Vec<Frame>) -> Self {
        metadata.frame_count = frames.len() as u32;
        Self {
            name: name.into(),
            metadata,
            frames,
            lms_pattern_instructions: None,
        }
    }

    pub fn led_count(&self) -> usize {
        self.metadata.led_count()
    }

    /// Sum of frame durations in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }

    /// Validate layout invariants and frame shapes.
    pub fn validate(&self) -> LmsResult<()> {
        validate_frames(&self.metadata, &self.frames)?;
        if self.metadata.frame_count as usize != self.frames.len() {
            return Err(LmsError::validation(format!(
                "metadata frame_count {} does not match {} frames",
                self.metadata.frame_count,
                self.frames.len()
            )));
        }
        Ok(())
    }
}

/// Check that dimensions are non-zero and every frame has `width*height` pixels.
pub fn validate_frames(metadata: &PatternMetadata, frames: &[Frame]) -> LmsResult<()> {
    if metadata.width == 0 || metadata.height == 0 {
        return Err(LmsError::validation("pattern width/height must be > 0"));
    }
    let expected = metadata.led_count();
    for (i, f) in frames.iter().enumerate() {
        if f.led_count() != expected {
            return Err(LmsError::validation(format!(
                "frame {i} has {} LEDs, expected {expected}",
                f.led_count()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pattern/model.rs"]
mod tests;
