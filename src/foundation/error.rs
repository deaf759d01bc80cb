/// Convenience result type used across the crate.
pub type LmsResult<T> = Result<T, LmsError>;

/// Preview sizes above this are refused regardless of configuration.
pub const MAX_PREVIEW_FRAMES_HARD: u64 = 1_000_000;

/// Top-level error taxonomy used by instruction, simulator, and codec APIs.
#[derive(thiserror::Error, Debug)]
pub enum LmsError {
    /// Malformed instruction or pattern data.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Queue edit addressed an index outside the sequence.
    #[error("index out of bounds: {index} (sequence length {len})")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Sequence length at the time of the edit.
        len: usize,
    },

    /// A layer binding did not name a frame present in the pattern.
    #[error("unresolved binding '{0}'")]
    UnresolvedBinding(String),

    /// The planned preview exceeds the configured frame bound.
    #[error("preview too large: {requested} frames exceeds limit of {limit}")]
    PreviewTooLarge {
        /// Frames the sequence would emit (saturated at `u64::MAX`).
        requested: u64,
        /// Active frame bound.
        limit: u64,
    },

    /// Decode or encode failure with a specific cause.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Instruction and pattern construction failures, surfaced at edit time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `repeat` must be at least 1.
    #[error("repeat must be >= 1")]
    InvalidRepeat,

    /// Action code outside the known set.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// Action requires a parameter that is absent.
    #[error("action '{action}' requires parameter '{param}'")]
    MissingParam {
        /// Legacy action code.
        action: String,
        /// Missing parameter key.
        param: String,
    },

    /// Parameter present but of the wrong type or out of range.
    #[error("action '{action}' parameter '{param}' {reason}")]
    InvalidParam {
        /// Legacy action code.
        action: String,
        /// Parameter key.
        param: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Any other structural problem (pattern shape, metadata).
    #[error("{0}")]
    Invalid(String),
}

/// Specific decode/encode failure causes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload dimensions cannot be chosen without contradicting the hints.
    #[error("ambiguous dimensions: {0}")]
    AmbiguousDimensions(String),

    /// Payload ended before the structure it declares.
    #[error("truncated payload: expected {expected} bytes, found {actual}")]
    TruncatedPayload {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Header declares a version this codec cannot read.
    #[error("unsupported {format} version {found} (max {max})")]
    UnsupportedVersion {
        /// Format name.
        format: &'static str,
        /// Version found in the payload.
        found: u32,
        /// Highest supported version.
        max: u32,
    },

    /// Structurally invalid content.
    #[error("malformed {format} payload: {detail}")]
    Malformed {
        /// Format name.
        format: &'static str,
        /// Human-readable cause.
        detail: String,
    },

    /// Intel HEX record checksum did not match.
    #[error("checksum mismatch on line {line}: expected {expected:02X}, found {found:02X}")]
    ChecksumMismatch {
        /// 1-based line number.
        line: usize,
        /// Computed checksum.
        expected: u8,
        /// Checksum stored in the record.
        found: u8,
    },
}

impl LmsError {
    /// Build a [`ValidationError::Invalid`] wrapped in [`LmsError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationError::Invalid(msg.into()))
    }

    /// Build a [`LmsError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`CodecError::Malformed`] wrapped in [`LmsError::Codec`].
    pub fn malformed(format: &'static str, detail: impl Into<String>) -> Self {
        Self::Codec(CodecError::Malformed {
            format,
            detail: detail.into(),
        })
    }

    /// Build a [`CodecError::TruncatedPayload`] wrapped in [`LmsError::Codec`].
    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::Codec(CodecError::TruncatedPayload { expected, actual })
    }

    /// `true` when the caller must refuse to run rather than retry with smaller input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PreviewTooLarge { requested, .. } if *requested > MAX_PREVIEW_FRAMES_HARD
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
