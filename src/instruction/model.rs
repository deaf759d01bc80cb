use crate::{
    foundation::error::{LmsError, LmsResult, ValidationError},
    instruction::action::{ActionCode, ActionParams, parse_action_params},
};

/// Legacy token meaning "no layer bound".
pub const NULL_SLOT: &str = "NULL";

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Reference to a frame-buffer slot. Never owns pixels.
pub struct LayerBinding {
    /// Exported slot label, e.g. `Frame1`.
    pub slot: String,
    /// Zero-based frame index; takes precedence over the slot label when in range.
    #[serde(default)]
    pub frame_index: Option<usize>,
    /// Display name.
    #[serde(default)]
    pub alias: Option<String>,
}

impl LayerBinding {
    pub fn new(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            frame_index: None,
            alias: None,
        }
    }

    /// Binding for a zero-based frame index, labelled `Frame{index+1}`.
    pub fn frame(index: usize) -> Self {
        Self {
            slot: format!("Frame{}", index + 1),
            frame_index: Some(index),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parse a legacy slot token; `NULL` (any case) and empty tokens mean no binding.
    pub fn from_legacy_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case(NULL_SLOT) {
            None
        } else {
            Some(Self::new(token))
        }
    }

    /// Resolve to a frame index in `0..frame_count`.
    pub fn resolve(&self, frame_count: usize) -> LmsResult<usize> {
        if let Some(i) = self.frame_index
            && i < frame_count
        {
            return Ok(i);
        }
        if let Some(n) = slot_number(&self.slot)
            && (1..=frame_count).contains(&n)
        {
            return Ok(n - 1);
        }
        Err(LmsError::UnresolvedBinding(self.slot.clone()))
    }

    /// `true` when the binding carries more than a slot label.
    pub fn is_extended(&self) -> bool {
        self.frame_index.is_some() || self.alias.is_some()
    }
}

fn slot_number(slot: &str) -> Option<usize> {
    let slot = slot.trim();
    let prefix = slot.get(..5)?;
    if !prefix.eq_ignore_ascii_case("frame") {
        return None;
    }
    slot[5..].parse::<usize>().ok()
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawInstruction", into = "RawInstruction")]
/// A single validated firmware action.
///
/// Fields are private so an `Instruction` can only exist in a validated state; the
/// typed parameter view is computed once at construction.
pub struct Instruction {
    action: ActionCode,
    params: serde_json::Map<String, serde_json::Value>,
    repeat: u32,
    gap: u32,
    brightness_delta: Option<i16>,
    typed: ActionParams,
}

impl Instruction {
    /// Validate and build an instruction.
    ///
    /// `repeat` is a hardware execution count and must be at least 1. `gap` is frame
    /// spacing in frame slots, not milliseconds.
    pub fn new(
        action: ActionCode,
        params: serde_json::Map<String, serde_json::Value>,
        repeat: u32,
        gap: u32,
    ) -> Result<Self, ValidationError> {
        if repeat == 0 {
            return Err(ValidationError::InvalidRepeat);
        }
        let typed = parse_action_params(action, &params)?;
        Ok(Self {
            action,
            params,
            repeat,
            gap,
            brightness_delta: None,
            typed,
        })
    }

    /// Like [`Instruction::new`] but from a legacy code string.
    pub fn parse(
        code: &str,
        params: serde_json::Map<String, serde_json::Value>,
        repeat: u32,
        gap: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(ActionCode::parse(code)?, params, repeat, gap)
    }

    /// Instruction with no parameters.
    pub fn simple(action: ActionCode, repeat: u32, gap: u32) -> Result<Self, ValidationError> {
        Self::new(action, serde_json::Map::new(), repeat, gap)
    }

    pub fn with_brightness_delta(mut self, delta: i16) -> Self {
        self.brightness_delta = Some(delta);
        self
    }

    pub fn action(&self) -> ActionCode {
        self.action
    }

    /// Raw parameter map, unknown keys included.
    pub fn params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.params
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }

    pub fn brightness_delta(&self) -> Option<i16> {
        self.brightness_delta
    }

    pub fn typed_params(&self) -> &ActionParams {
        &self.typed
    }

    /// Brightness delta in effect: the explicit field, else the `delta` param, else 0.
    pub fn effective_brightness_delta(&self) -> i16 {
        if let Some(d) = self.brightness_delta {
            return d;
        }
        match self.typed {
            ActionParams::Brightness(p) => p.delta,
            _ => 0,
        }
    }

    pub fn set_repeat(&mut self, repeat: u32) -> Result<(), ValidationError> {
        if repeat == 0 {
            return Err(ValidationError::InvalidRepeat);
        }
        self.repeat = repeat;
        Ok(())
    }

    pub fn set_gap(&mut self, gap: u32) {
        self.gap = gap;
    }

    /// Replace the parameter map, re-validating it against the action.
    pub fn set_params(
        &mut self,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ValidationError> {
        self.typed = parse_action_params(self.action, &params)?;
        self.params = params;
        Ok(())
    }
}

/// Legacy JSON shape of an instruction, before validation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct RawInstruction {
    pub code: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_repeat")]
    pub repeat: i64,
    #[serde(default)]
    pub gap: i64,
    #[serde(default)]
    pub brightness_delta: Option<i64>,
}

fn default_repeat() -> i64 {
    1
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = ValidationError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        let action = ActionCode::parse(&raw.code)?;
        if raw.repeat < 1 || raw.repeat > i64::from(u32::MAX) {
            return Err(ValidationError::InvalidRepeat);
        }
        let gap = u32::try_from(raw.gap).map_err(|_| {
            ValidationError::Invalid(format!("gap must be >= 0 frame slots, got {}", raw.gap))
        })?;
        let mut inst = Self::new(action, raw.parameters, raw.repeat as u32, gap)?;
        if let Some(d) = raw.brightness_delta {
            let d = i16::try_from(d).map_err(|_| ValidationError::InvalidParam {
                action: action.code().to_string(),
                param: "brightness_delta".to_string(),
                reason: "out of range".to_string(),
            })?;
            inst = inst.with_brightness_delta(d);
        }
        Ok(inst)
    }
}

impl From<Instruction> for RawInstruction {
    fn from(i: Instruction) -> Self {
        Self {
            code: i.action.code().to_string(),
            parameters: i.params,
            repeat: i64::from(i.repeat),
            gap: i64::from(i.gap),
            brightness_delta: i.brightness_delta.map(i64::from),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// One queue entry: an instruction applied to a primary layer, with optional
/// second layer and mask.
pub struct PatternInstruction {
    #[serde(rename = "source")]
    pub primary: LayerBinding,
    pub instruction: Instruction,
    #[serde(rename = "layer2", default)]
    pub secondary: Option<LayerBinding>,
    #[serde(default)]
    pub mask: Option<LayerBinding>,
}

/// `(FrameSlot, Code, Layer2Slot|NULL, MaskSlot|NULL, Repeat)`.
pub type LegacyTuple = (String, String, String, String, u32);

impl PatternInstruction {
    pub fn new(primary: LayerBinding, instruction: Instruction) -> Self {
        Self {
            primary,
            instruction,
            secondary: None,
            mask: None,
        }
    }

    pub fn with_secondary(mut self, binding: LayerBinding) -> Self {
        self.secondary = Some(binding);
        self
    }

    pub fn with_mask(mut self, binding: LayerBinding) -> Self {
        self.mask = Some(binding);
        self
    }

    pub fn to_legacy_tuple(&self) -> LegacyTuple {
        let slot = |b: &Option<LayerBinding>| {
            b.as_ref()
                .map_or_else(|| NULL_SLOT.to_string(), |b| b.slot.clone())
        };
        (
            self.primary.slot.clone(),
            self.instruction.action().code().to_string(),
            slot(&self.secondary),
            slot(&self.mask),
            self.instruction.repeat(),
        )
    }

    /// Primary, secondary, and mask bindings in that order.
    pub fn bindings(&self) -> impl Iterator<Item = &LayerBinding> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .chain(self.mask.as_ref())
    }

    /// Check that every binding resolves against a pattern with `frame_count` frames.
    pub fn check_bindings(&self, frame_count: usize) -> LmsResult<()> {
        for b in self.bindings() {
            b.resolve(frame_count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/instruction/model.rs"]
mod tests;
