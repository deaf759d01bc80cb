use crate::{
    foundation::error::{LmsError, LmsResult},
    instruction::{
        action::ActionCode,
        model::{Instruction, LayerBinding, PatternInstruction, RawInstruction},
    },
    simulate::config::GapPolicy,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Ordered automation queue. Order is execution order.
pub struct InstructionSequence {
    instructions: Vec<PatternInstruction>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// What a queue edit changed.
pub enum SequenceChange {
    Inserted { index: usize },
    Removed { index: usize, removed: PatternInstruction },
    Moved { from: usize, to: usize },
    Duplicated { source: usize, index: usize },
    Replaced { index: usize },
    Cleared { count: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// Aggregate view of a sequence for editors and `lms inspect`.
pub struct SequenceSummary {
    pub instruction_count: usize,
    pub total_repeats: u64,
    pub total_gap: u64,
    /// Distinct actions in first-use order.
    pub actions: Vec<ActionCode>,
    /// Preview frames under [`GapPolicy::DuplicateLast`]; `None` on overflow.
    pub planned_frames: Option<u64>,
}

impl InstructionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternInstruction> {
        self.instructions.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PatternInstruction> {
        self.instructions.get(index)
    }

    pub fn as_slice(&self) -> &[PatternInstruction] {
        &self.instructions
    }

    fn out_of_bounds(&self, index: usize) -> LmsError {
        LmsError::IndexOutOfBounds {
            index,
            len: self.instructions.len(),
        }
    }

    pub fn push(&mut self, item: PatternInstruction) -> SequenceChange {
        self.instructions.push(item);
        SequenceChange::Inserted {
            index: self.instructions.len() - 1,
        }
    }

    /// Insert at `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, item: PatternInstruction) -> LmsResult<SequenceChange> {
        if index > self.instructions.len() {
            return Err(self.out_of_bounds(index));
        }
        self.instructions.insert(index, item);
        Ok(SequenceChange::Inserted { index })
    }

    pub fn remove(&mut self, index: usize) -> LmsResult<SequenceChange> {
        if index >= self.instructions.len() {
            return Err(self.out_of_bounds(index));
        }
        let removed = self.instructions.remove(index);
        Ok(SequenceChange::Removed { index, removed })
    }

    /// Move the entry at `from` so that it ends up at `to`.
    pub fn move_instruction(&mut self, from: usize, to: usize) -> LmsResult<SequenceChange> {
        let len = self.instructions.len();
        if from >= len {
            return Err(self.out_of_bounds(from));
        }
        if to >= len {
            return Err(self.out_of_bounds(to));
        }
        if from != to {
            let item = self.instructions.remove(from);
            self.instructions.insert(to, item);
        }
        Ok(SequenceChange::Moved { from, to })
    }

    /// Insert a copy of entry `index` directly after it.
    pub fn duplicate(&mut self, index: usize) -> LmsResult<SequenceChange> {
        let item = self
            .instructions
            .get(index)
            .cloned()
            .ok_or_else(|| self.out_of_bounds(index))?;
        self.instructions.insert(index + 1, item);
        Ok(SequenceChange::Duplicated {
            source: index,
            index: index + 1,
        })
    }

    pub fn replace(&mut self, index: usize, item: PatternInstruction) -> LmsResult<SequenceChange> {
        let len = self.instructions.len();
        let slot = self
            .instructions
            .get_mut(index)
            .ok_or(LmsError::IndexOutOfBounds { index, len })?;
        *slot = item;
        Ok(SequenceChange::Replaced { index })
    }

    pub fn clear(&mut self) -> SequenceChange {
        let count = self.instructions.len();
        self.instructions.clear();
        SequenceChange::Cleared { count }
    }

    /// Frames a preview of this sequence emits, with checked arithmetic.
    pub fn planned_frame_count(&self, policy: GapPolicy) -> Option<u64> {
        self.instructions.iter().try_fold(0u64, |acc, pi| {
            let repeat = u64::from(pi.instruction.repeat());
            let per_repeat = match policy {
                GapPolicy::DuplicateLast => u64::from(pi.instruction.gap()).checked_add(1)?,
                GapPolicy::Drop => 1,
            };
            acc.checked_add(repeat.checked_mul(per_repeat)?)
        })
    }

    pub fn summarize(&self) -> SequenceSummary {
        let mut actions = Vec::new();
        let mut total_repeats = 0u64;
        let mut total_gap = 0u64;
        for pi in &self.instructions {
            let a = pi.instruction.action();
            if !actions.contains(&a) {
                actions.push(a);
            }
            total_repeats = total_repeats.saturating_add(u64::from(pi.instruction.repeat()));
            total_gap = total_gap.saturating_add(u64::from(pi.instruction.gap()));
        }
        SequenceSummary {
            instruction_count: self.instructions.len(),
            total_repeats,
            total_gap,
            actions,
            planned_frames: self.planned_frame_count(GapPolicy::DuplicateLast),
        }
    }

    /// Legacy JSON list: `[{source, instruction: {code, parameters, repeat, gap,
    /// brightness_delta}, layer2, mask}, ...]`.
    pub fn to_serializable(&self) -> LmsResult<serde_json::Value> {
        serde_json::to_value(&self.instructions).map_err(|e| LmsError::serde(e.to_string()))
    }

    /// Inverse of [`InstructionSequence::to_serializable`]; every entry is re-validated.
    pub fn from_serializable(value: &serde_json::Value) -> LmsResult<Self> {
        let raw: Vec<RawPatternInstruction> = serde_json::from_value(value.clone())
            .map_err(|e| LmsError::serde(e.to_string()))?;
        let instructions = raw
            .into_iter()
            .map(|r| {
                Ok(PatternInstruction {
                    primary: r.source,
                    instruction: Instruction::try_from(r.instruction)?,
                    secondary: r.layer2,
                    mask: r.mask,
                })
            })
            .collect::<LmsResult<Vec<_>>>()?;
        Ok(Self { instructions })
    }
}

#[derive(serde::Deserialize)]
struct RawPatternInstruction {
    source: LayerBinding,
    instruction: RawInstruction,
    #[serde(default)]
    layer2: Option<LayerBinding>,
    #[serde(default)]
    mask: Option<LayerBinding>,
}

impl FromIterator<PatternInstruction> for InstructionSequence {
    fn from_iter<T: IntoIterator<Item = PatternInstruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a InstructionSequence {
    type Item = &'a PatternInstruction;
    type IntoIter = std::slice::Iter<'a, PatternInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/instruction/sequence.rs"]
mod tests;
