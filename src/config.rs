use std::path::Path;

use anyhow::Context as _;

use crate::{
    codec::{hex::HexOptions, infer::InferenceHint},
    foundation::error::{LmsError, LmsResult},
    simulate::config::SimulationConfig,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Settings shared by the CLI and embedding editors. Every section is optional.
///
/// ```json
/// { "simulation": { "max_frames": 5000, "gap_policy": "drop" },
///   "inference": { "aspect": { "width": 16, "height": 8 } },
///   "hex": { "record_len": 32 } }
/// ```
pub struct LmsConfig {
    pub simulation: SimulationConfig,
    /// Last known layout, used when a payload does not state its own dimensions.
    pub inference: InferenceHint,
    pub hex: HexOptions,
}

impl LmsConfig {
    pub fn from_json_str(s: &str) -> LmsResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| LmsError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> LmsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> LmsResult<()> {
        self.simulation.validate()?;
        if self.hex.record_len == 0 {
            return Err(LmsError::validation("hex record_len must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
