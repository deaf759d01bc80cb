use super::*;
use crate::{
    foundation::math::frames_digest,
    instruction::model::LayerBinding,
    pattern::model::PatternMetadata,
};
use serde_json::json;

fn ramp_pattern(w: u32, h: u32, frames: usize) -> Pattern {
    let n = (w * h) as usize;
    let frames = (0..frames)
        .map(|f| Frame::new((0..n).map(|i| Rgb::grey((i + f * n) as u8)).collect(), 40))
        .collect();
    Pattern::new("ramp", PatternMetadata::without_wiring(w, h, 0), frames)
}

fn step(action: ActionCode, params: serde_json::Value, repeat: u32, gap: u32) -> PatternInstruction {
    PatternInstruction::new(
        LayerBinding::new("Frame1"),
        Instruction::new(action, params.as_object().cloned().unwrap(), repeat, gap).unwrap(),
    )
}

fn seq(items: Vec<PatternInstruction>) -> InstructionSequence {
    items.into_iter().collect()
}

#[test]
fn move_left_repeat_three_gap_one() {
    let p = ramp_pattern(4, 4, 3);
    let s = seq(vec![step(ActionCode::MoveLeft1, json!({}), 3, 1)]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out.len(), 6);

    let shape = GridShape::new(4, 4);
    let mut expected = p.frames[0].pixels.clone();
    for k in 0..3 {
        expected = grid::shift_wrap(shape, &expected, -1, 0);
        assert_eq!(out[2 * k].pixels, expected);
        assert_eq!(out[2 * k + 1], out[2 * k]);
    }
    assert!(out.iter().all(|f| f.duration_ms == 40));
}

#[test]
fn drop_policy_emits_only_repeats() {
    let p = ramp_pattern(4, 4, 1);
    let s = seq(vec![
        step(ActionCode::Invert, json!({}), 2, 5),
        step(ActionCode::MirrorH, json!({}), 3, 2),
    ]);
    let cfg = SimulationConfig {
        gap_policy: GapPolicy::Drop,
        ..SimulationConfig::default()
    };
    assert_eq!(simulate_with(&p, &s, &cfg).unwrap().len(), 5);
    assert_eq!(simulate(&p, &s).unwrap().len(), 2 * 6 + 3 * 3);
}

#[test]
fn simulate_never_mutates_pattern() {
    let p = ramp_pattern(5, 3, 2);
    let before = p.clone();
    let digest = frames_digest(&p.frames);
    let s = seq(vec![
        step(ActionCode::Rotate90, json!({ "turns": 1 }), 2, 0),
        step(ActionCode::Randomize, json!({ "seed": 3, "strength": 128 }), 2, 1),
        step(ActionCode::ScrollText, json!({ "text": "HI" }), 4, 0),
    ]);
    simulate(&p, &s).unwrap();
    assert_eq!(p, before);
    assert_eq!(frames_digest(&p.frames), digest);
}

#[test]
fn unresolved_binding_aborts_with_no_frames() {
    let p = ramp_pattern(2, 2, 2);
    let mut s = seq(vec![step(ActionCode::Invert, json!({}), 1, 0)]);
    s.push(PatternInstruction::new(
        LayerBinding::new("Frame7"),
        Instruction::simple(ActionCode::Invert, 1, 0).unwrap(),
    ));
    let err = simulate(&p, &s).unwrap_err();
    assert!(matches!(err, LmsError::UnresolvedBinding(ref slot) if slot == "Frame7"));
}

#[test]
fn preview_bound_is_checked_before_work() {
    let p = ramp_pattern(2, 2, 1);
    let s = seq(vec![step(ActionCode::Invert, json!({}), 10, 9)]);
    let cfg = SimulationConfig {
        max_frames: 99,
        ..SimulationConfig::default()
    };
    let err = simulate_with(&p, &s, &cfg).unwrap_err();
    assert!(matches!(
        err,
        LmsError::PreviewTooLarge {
            requested: 100,
            limit: 99
        }
    ));
    assert!(!err.is_fatal());

    let huge = seq(vec![step(ActionCode::Invert, json!({}), u32::MAX, u32::MAX)]);
    let err = simulate(&p, &huge).unwrap_err();
    assert!(err.is_fatal());

    let cfg = SimulationConfig {
        max_frames: 2_000_000,
        ..SimulationConfig::default()
    };
    assert!(simulate_with(&p, &s, &cfg).unwrap_err().is_fatal());
}

#[test]
fn mask_limits_changes() {
    let mut p = ramp_pattern(2, 1, 2);
    p.frames[1].pixels = vec![Rgb::BLACK, Rgb::WHITE];
    let s = seq(vec![
        step(ActionCode::Invert, json!({}), 1, 0).with_mask(LayerBinding::new("Frame2")),
    ]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out[0].pixels, vec![Rgb::grey(0), Rgb::grey(254)]);
}

#[test]
fn fade_ramps_to_black_or_second_layer() {
    let mut p = ramp_pattern(1, 1, 2);
    p.frames[0].pixels = vec![Rgb::WHITE];
    p.frames[1].pixels = vec![Rgb::new(0, 0, 255)];

    let s = seq(vec![step(ActionCode::Fade, json!({}), 2, 0)]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out[1].pixels, vec![Rgb::BLACK]);
    assert!(out[0].pixels[0].r > 0 && out[0].pixels[0].r < 255);

    let s = seq(vec![
        step(ActionCode::Fade, json!({}), 3, 0).with_secondary(LayerBinding::new("Frame2")),
    ]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out[2].pixels, vec![Rgb::new(0, 0, 255)]);
}

#[test]
fn brightness_compounds_across_repeats() {
    let mut p = ramp_pattern(1, 1, 1);
    p.frames[0].pixels = vec![Rgb::grey(200)];
    let s = seq(vec![step(ActionCode::Brightness, json!({ "delta": -50 }), 2, 0)]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out[0].pixels, vec![Rgb::grey(100)]);
    assert_eq!(out[1].pixels, vec![Rgb::grey(50)]);
}

#[test]
fn randomize_is_deterministic() {
    let p = ramp_pattern(4, 4, 1);
    let s = seq(vec![step(ActionCode::Randomize, json!({ "seed": 42 }), 3, 0)]);
    let a = simulate(&p, &s).unwrap();
    let b = simulate(&p, &s).unwrap();
    assert_eq!(a, b);
    assert_ne!(a[0], a[1]);
}

#[test]
fn scroll_text_draws_over_primary() {
    let p = Pattern::new(
        "blank",
        PatternMetadata::without_wiring(16, 8, 0),
        vec![Frame::solid(128, Rgb::BLACK, 20)],
    );
    let s = seq(vec![step(
        ActionCode::ScrollText,
        json!({ "text": "W", "speed": 4, "color": "00FF00" }),
        4,
        0,
    )]);
    let out = simulate(&p, &s).unwrap();
    assert_eq!(out.len(), 4);
    for f in &out {
        assert!(f.pixels.iter().any(|px| *px == Rgb::new(0, 255, 0)));
    }
    assert_ne!(out[0], out[1]);
}

#[test]
fn empty_sequence_yields_no_frames() {
    let p = ramp_pattern(2, 2, 1);
    assert!(simulate(&p, &InstructionSequence::new()).unwrap().is_empty());
}
