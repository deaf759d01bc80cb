use crate::foundation::error::{LmsError, LmsResult, MAX_PREVIEW_FRAMES_HARD};

/// Default preview frame bound.
pub const DEFAULT_MAX_PREVIEW_FRAMES: u64 = 100_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// What the preview emits for an instruction's `gap` frame slots.
pub enum GapPolicy {
    /// Repeat the last emitted frame `gap` times (firmware behaviour).
    #[default]
    DuplicateLast,
    /// Emit nothing for gap slots.
    Drop,
}

impl std::str::FromStr for GapPolicy {
    type Err = LmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "duplicate_last" | "duplicate" => Ok(Self::DuplicateLast),
            "drop" => Ok(Self::Drop),
            other => Err(LmsError::validation(format!("unknown gap policy '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Preview simulator settings.
pub struct SimulationConfig {
    /// Largest preview the simulator will build.
    pub max_frames: u64,
    pub gap_policy: GapPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_PREVIEW_FRAMES,
            gap_policy: GapPolicy::DuplicateLast,
        }
    }
}

impl SimulationConfig {
    /// Refuse bounds above the hard ceiling.
    pub fn validate(&self) -> LmsResult<()> {
        if self.max_frames > MAX_PREVIEW_FRAMES_HARD {
            return Err(LmsError::PreviewTooLarge {
                requested: self.max_frames,
                limit: MAX_PREVIEW_FRAMES_HARD,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/simulate/config.rs"]
mod tests;
