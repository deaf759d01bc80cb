use crate::{
    foundation::{core::Frame, error::LmsResult},
    instruction::sequence::InstructionSequence,
    pattern::model::Pattern,
    simulate::{config::SimulationConfig, simulator::simulate_with},
};

/// Attach `sequence` to `pattern` as its exported automation queue.
///
/// Nothing is written unless the pattern validates and every binding in the
/// sequence resolves against its frames. Frames are never touched.
#[tracing::instrument(skip_all, fields(instructions = sequence.len(), frames = pattern.frames.len()))]
pub fn finalize(pattern: &mut Pattern, sequence: InstructionSequence) -> LmsResult<()> {
    pattern.validate()?;
    let frame_count = pattern.frames.len();
    for item in &sequence {
        item.check_bindings(frame_count)?;
    }
    pattern.lms_pattern_instructions = Some(sequence);
    tracing::debug!("sequence finalized");
    Ok(())
}

/// Editable copy of the finalized queue; empty when none is attached.
pub fn reopen_queue(pattern: &Pattern) -> InstructionSequence {
    pattern.lms_pattern_instructions.clone().unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Simulated frames waiting for the user to keep or discard them.
pub struct PreviewOverlay {
    frames: Vec<Frame>,
}

impl PreviewOverlay {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Run the simulator and wrap its output.
    pub fn from_simulation(
        pattern: &Pattern,
        sequence: &InstructionSequence,
        config: &SimulationConfig,
    ) -> LmsResult<Self> {
        simulate_with(pattern, sequence, config).map(Self::new)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Replace the pattern's frames with the preview.
    ///
    /// The attached queue is kept as-is; its bindings may no longer resolve if the
    /// preview is shorter than the original pattern.
    pub fn apply(self, pattern: &mut Pattern) {
        pattern.metadata.frame_count = self.frames.len() as u32;
        pattern.frames = self.frames;
    }

    /// Discard the preview, returning its frames.
    pub fn restore(self) -> Vec<Frame> {
        self.frames
    }
}

#[cfg(test)]
#[path = "../tests/unit/finalize/finalize.rs"]
mod tests;
