use super::*;
use crate::{
    foundation::{core::Rgb, error::LmsError},
    instruction::{
        action::ActionCode,
        model::{Instruction, LayerBinding, PatternInstruction},
    },
    pattern::model::PatternMetadata,
};

fn pattern(frames: usize) -> Pattern {
    Pattern::new(
        "p",
        PatternMetadata::without_wiring(2, 1, 0),
        (0..frames)
            .map(|i| Frame::new(vec![Rgb::grey(i as u8), Rgb::BLACK], 20))
            .collect(),
    )
}

fn invert_on(slot: &str) -> PatternInstruction {
    PatternInstruction::new(
        LayerBinding::new(slot),
        Instruction::simple(ActionCode::Invert, 2, 0).unwrap(),
    )
}

#[test]
fn finalize_attaches_and_reopen_copies() {
    let mut p = pattern(2);
    let seq: InstructionSequence = [invert_on("Frame2")].into_iter().collect();
    finalize(&mut p, seq.clone()).unwrap();
    assert_eq!(p.lms_pattern_instructions.as_ref(), Some(&seq));

    let mut edit = reopen_queue(&p);
    edit.clear();
    assert_eq!(p.lms_pattern_instructions.as_ref().map(|s| s.len()), Some(1));
    assert!(reopen_queue(&pattern(1)).is_empty());
}

#[test]
fn unresolved_binding_leaves_pattern_untouched() {
    let mut p = pattern(2);
    let before = p.clone();
    let seq: InstructionSequence = [invert_on("Frame1"), invert_on("Frame3")]
        .into_iter()
        .collect();
    let err = finalize(&mut p, seq).unwrap_err();
    assert!(matches!(err, LmsError::UnresolvedBinding(ref s) if s == "Frame3"));
    assert_eq!(p, before);
}

#[test]
fn overlay_apply_and_restore() {
    let p = pattern(1);
    let seq: InstructionSequence = [invert_on("Frame1")].into_iter().collect();
    let overlay = PreviewOverlay::from_simulation(&p, &seq, &SimulationConfig::default()).unwrap();
    assert_eq!(overlay.len(), 2);

    let kept = overlay.clone().restore();
    assert_eq!(kept.len(), 2);

    let mut applied = p.clone();
    overlay.apply(&mut applied);
    assert_eq!(applied.metadata.frame_count, 2);
    assert_eq!(applied.frames[0].pixels, vec![Rgb::WHITE, Rgb::WHITE]);
    assert_eq!(applied.frames[1].pixels, vec![Rgb::BLACK, Rgb::BLACK]);
    applied.validate().unwrap();
}

#[test]
fn overlay_propagates_preview_errors() {
    let p = pattern(1);
    let seq: InstructionSequence = [invert_on("Frame1")].into_iter().collect();
    let cfg = SimulationConfig {
        max_frames: 1,
        ..SimulationConfig::default()
    };
    assert!(matches!(
        PreviewOverlay::from_simulation(&p, &seq, &cfg),
        Err(LmsError::PreviewTooLarge { requested: 2, limit: 1 })
    ));
}
