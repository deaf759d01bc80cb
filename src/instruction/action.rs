use crate::foundation::{core::Rgb, error::ValidationError};

/// Closed set of playback-time actions the firmware understands.
///
/// Serialized with the legacy camelCase codes (`moveLeft1`, `rotate90`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ActionCode {
    #[serde(rename = "moveLeft1")]
    MoveLeft1,
    #[serde(rename = "moveRight1")]
    MoveRight1,
    #[serde(rename = "moveUp1")]
    MoveUp1,
    #[serde(rename = "moveDown1")]
    MoveDown1,
    #[serde(rename = "rotate90")]
    Rotate90,
    #[serde(rename = "mirrorH")]
    MirrorH,
    #[serde(rename = "mirrorV")]
    MirrorV,
    #[serde(rename = "invert")]
    Invert,
    #[serde(rename = "scrollText")]
    ScrollText,
    #[serde(rename = "brightness")]
    Brightness,
    #[serde(rename = "fade")]
    Fade,
    #[serde(rename = "randomize")]
    Randomize,
}

impl ActionCode {
    pub const ALL: [Self; 12] = [
        Self::MoveLeft1,
        Self::MoveRight1,
        Self::MoveUp1,
        Self::MoveDown1,
        Self::Rotate90,
        Self::MirrorH,
        Self::MirrorV,
        Self::Invert,
        Self::ScrollText,
        Self::Brightness,
        Self::Fade,
        Self::Randomize,
    ];

    /// Legacy wire code.
    pub fn code(self) -> &'static str {
        match self {
            Self::MoveLeft1 => "moveLeft1",
            Self::MoveRight1 => "moveRight1",
            Self::MoveUp1 => "moveUp1",
            Self::MoveDown1 => "moveDown1",
            Self::Rotate90 => "rotate90",
            Self::MirrorH => "mirrorH",
            Self::MirrorV => "mirrorV",
            Self::Invert => "invert",
            Self::ScrollText => "scrollText",
            Self::Brightness => "brightness",
            Self::Fade => "fade",
            Self::Randomize => "randomize",
        }
    }

    /// Short human-readable description for editors and `lms inspect`.
    pub fn description(self) -> &'static str {
        match self {
            Self::MoveLeft1 => "Shift pixels left by one column",
            Self::MoveRight1 => "Shift pixels right by one column",
            Self::MoveUp1 => "Shift pixels up by one row",
            Self::MoveDown1 => "Shift pixels down by one row",
            Self::Rotate90 => "Rotate the frame by quarter turns",
            Self::MirrorH => "Mirror horizontally (left/right)",
            Self::MirrorV => "Mirror vertically (top/bottom)",
            Self::Invert => "Invert frame colours",
            Self::ScrollText => "Scroll a text banner right to left",
            Self::Brightness => "Scale brightness by a percentage delta",
            Self::Fade => "Fade toward black or a second layer",
            Self::Randomize => "Blend in seeded pseudo-random pixels",
        }
    }

    /// Match a legacy code, ignoring ASCII case.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let trimmed = code.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownAction(trimmed.to_string()))
    }
}

impl std::str::FromStr for ActionCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ActionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Typed view over an instruction's parameter map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionParams {
    Rotate(RotateParams),
    ScrollText(ScrollTextParams),
    Brightness(BrightnessParams),
    Fade(FadeParams),
    Randomize(RandomizeParams),
    /// Action takes no parameters.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotateParams {
    /// Quarter turns; positive is clockwise.
    pub turns: i32,
}

impl RotateParams {
    /// Clockwise quarter turns in `0..4`.
    pub fn normalized(self) -> u8 {
        self.turns.rem_euclid(4) as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollTextParams {
    pub text: String,
    /// Columns advanced per repeat.
    pub speed: u32,
    pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightnessParams {
    /// Percentage delta; the buffer is scaled by `(100 + delta) / 100`.
    pub delta: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadeParams {
    /// Final fade amount reached on the last repeat.
    pub strength: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomizeParams {
    pub seed: u64,
    /// Blend amount of the noise layer.
    pub strength: u8,
}

type ParamMap = serde_json::Map<String, serde_json::Value>;

fn invalid(action: ActionCode, param: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidParam {
        action: action.code().to_string(),
        param: param.to_string(),
        reason: reason.into(),
    }
}

fn missing(action: ActionCode, param: &str) -> ValidationError {
    ValidationError::MissingParam {
        action: action.code().to_string(),
        param: param.to_string(),
    }
}

fn get_i64(
    action: ActionCode,
    params: &ParamMap,
    key: &str,
    min: i64,
    max: i64,
) -> Result<Option<i64>, ValidationError> {
    let Some(v) = params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    let n = v
        .as_i64()
        .ok_or_else(|| invalid(action, key, "must be an integer"))?;
    if !(min..=max).contains(&n) {
        return Err(invalid(action, key, format!("must be in {min}..={max}")));
    }
    Ok(Some(n))
}

fn get_u64(action: ActionCode, params: &ParamMap, key: &str) -> Result<Option<u64>, ValidationError> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(action, key, "must be a non-negative integer")),
    }
}

/// Parse the typed parameters for `action` out of a generic map.
///
/// Keys the action does not know are ignored here and stay in the map untouched.
pub fn parse_action_params(
    action: ActionCode,
    params: &ParamMap,
) -> Result<ActionParams, ValidationError> {
    match action {
        ActionCode::Rotate90 => {
            let turns = get_i64(action, params, "turns", i64::from(i32::MIN), i64::from(i32::MAX))?
                .ok_or_else(|| missing(action, "turns"))?;
            Ok(ActionParams::Rotate(RotateParams {
                turns: turns as i32,
            }))
        }
        ActionCode::ScrollText => {
            let text = match params.get("text") {
                None | Some(serde_json::Value::Null) => return Err(missing(action, "text")),
                Some(v) => v
                    .as_str()
                    .ok_or_else(|| invalid(action, "text", "must be a string"))?,
            };
            if text.is_empty() {
                return Err(invalid(action, "text", "must be non-empty"));
            }
            let speed = get_i64(action, params, "speed", 1, i64::from(u16::MAX))?.unwrap_or(1);
            let color = match params.get("color") {
                None | Some(serde_json::Value::Null) => Rgb::WHITE,
                Some(v) => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| invalid(action, "color", "must be an RRGGBB string"))?;
                    Rgb::from_hex(s)
                        .map_err(|_| invalid(action, "color", format!("'{s}' is not RRGGBB")))?
                }
            };
            Ok(ActionParams::ScrollText(ScrollTextParams {
                text: text.to_string(),
                speed: speed as u32,
                color,
            }))
        }
        ActionCode::Brightness => {
            let delta = get_i64(action, params, "delta", -255, 255)?.unwrap_or(0);
            Ok(ActionParams::Brightness(BrightnessParams {
                delta: delta as i16,
            }))
        }
        ActionCode::Fade => {
            let strength = get_i64(action, params, "strength", 0, 255)?.unwrap_or(255);
            Ok(ActionParams::Fade(FadeParams {
                strength: strength as u8,
            }))
        }
        ActionCode::Randomize => {
            let seed = get_u64(action, params, "seed")?.unwrap_or(0);
            let strength = get_i64(action, params, "strength", 0, 255)?.unwrap_or(255);
            Ok(ActionParams::Randomize(RandomizeParams {
                seed,
                strength: strength as u8,
            }))
        }
        ActionCode::MoveLeft1
        | ActionCode::MoveRight1
        | ActionCode::MoveUp1
        | ActionCode::MoveDown1
        | ActionCode::MirrorH
        | ActionCode::MirrorV
        | ActionCode::Invert => Ok(ActionParams::None),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/instruction/action.rs"]
mod tests;
