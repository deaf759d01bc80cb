use super::*;
use crate::foundation::core::Rgb;
use serde_json::json;

fn params(v: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    v.as_object().cloned().unwrap_or_default()
}

fn rich_metadata() -> PatternMetadata {
    PatternMetadata {
        width: 2,
        height: 2,
        frame_count: 2,
        color_order: ColorOrder::Grb,
        wiring: WiringMode::Serpentine,
        data_in_corner: DataInCorner::RightBottom,
    }
}

fn rich_sequence() -> InstructionSequence {
    let scroll = Instruction::new(
        ActionCode::ScrollText,
        params(json!({"text": "Hi, there", "speed": 2, "color": "FF8000"})),
        4,
        2,
    )
    .unwrap();
    let fade = Instruction::new(ActionCode::Fade, params(json!({"strength": 128})), 3, 0)
        .unwrap()
        .with_brightness_delta(-20);
    [
        PatternInstruction::new(LayerBinding::new("Frame1"), scroll),
        PatternInstruction::new(LayerBinding::frame(0).with_alias("intro"), fade)
            .with_secondary(LayerBinding::new("Frame2"))
            .with_mask(LayerBinding::frame(1)),
        PatternInstruction::new(
            LayerBinding::new("Frame2"),
            Instruction::simple(ActionCode::MoveLeft1, 1, 0).unwrap(),
        ),
    ]
    .into_iter()
    .collect()
}

fn frames() -> Vec<Frame> {
    vec![
        Frame::new(vec![Rgb::WHITE, Rgb::BLACK, Rgb::new(1, 2, 3), Rgb::new(9, 8, 7)], 40),
        Frame::solid(4, Rgb::new(0x10, 0x20, 0x30), 20),
    ]
}

#[test]
fn full_round_trip_is_lossless() {
    let codec = LedsCodec::with_name("demo");
    let m = rich_metadata();
    let seq = rich_sequence();
    let f = frames();
    let bytes = codec.encode(&m, Some(&seq), Some(&f)).unwrap();
    let d = codec.decode(&bytes, &InferenceHint::default()).unwrap();
    assert_eq!(d.metadata, m);
    assert_eq!(d.sequence, Some(seq));
    assert_eq!(d.frames, Some(f));
    assert_eq!(d.name.as_deref(), Some("demo"));
}

#[test]
fn header_lines_keep_legacy_keys() {
    let bytes = LedsCodec::default()
        .encode(&rich_metadata(), Some(&rich_sequence()), None)
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("# LED Matrix Studio Export\n# Version: 1\n# Width: 2\n"));
    assert!(text.contains("# Serpentine: true\n"));
    assert!(text.contains("# Orientation: RowRightToLeftBottomUp\n"));
    assert!(text.contains("# Color Order: GRB\n"));
    assert!(text.contains("Pattern1: Frame1, scrollText, NULL, NULL, 4\n"));
    assert!(text.contains("Pattern2: Frame1, fade, Frame2, Frame2, 3\n"));
    assert!(text.contains("# pattern1_gap: 2\n"));
    assert!(text.contains("# pattern2_brightness: -20\n"));
    assert!(text.contains("# (frame data omitted)"));
    assert!(!text.contains("pattern3_"));
}

#[test]
fn sequence_only_decodes_without_frames() {
    let m = rich_metadata();
    let bytes = LedsCodec::default()
        .encode(&m, Some(&rich_sequence()), None)
        .unwrap();
    let d = LedsCodec::default()
        .decode(&bytes, &InferenceHint::default())
        .unwrap();
    assert_eq!(d.frames, None);
    assert_eq!(d.metadata.frame_count, 2);
    assert_eq!(d.sequence.map(|s| s.len()), Some(3));
}

#[test]
fn legacy_file_infers_wiring_and_rotation() {
    let text = "\
# LED Matrix Studio Export
# Width: 8
# Height: 8
# Serpentine: false
# Orientation: RowLeftToRightBottomUp
Pattern1: Frame1, rotate90, NULL, NULL, 2
Pattern2: Frame1, MOVERIGHT1, null, NULL, 5
";
    let d = LedsCodec::default()
        .decode(text.as_bytes(), &InferenceHint::default())
        .unwrap();
    assert_eq!(d.metadata.wiring, WiringMode::RowMajor);
    assert_eq!(d.metadata.data_in_corner, DataInCorner::LeftBottom);
    assert_eq!(d.metadata.color_order, ColorOrder::Rgb);
    let seq = d.sequence.unwrap();
    let rotate = &seq.as_slice()[0].instruction;
    assert_eq!(rotate.params().get("turns"), Some(&json!(1)));
    assert_eq!(rotate.repeat(), 2);
    assert_eq!(seq.as_slice()[1].instruction.action(), ActionCode::MoveRight1);
    assert_eq!(seq.as_slice()[1].secondary, None);
}

#[test]
fn missing_wiring_hints_stay_unknown() {
    let d = LedsCodec::default()
        .decode(b"# Width: 4\n# Height: 1\n", &InferenceHint::default())
        .unwrap();
    assert_eq!(d.metadata.wiring, WiringMode::Unknown);
    assert_eq!(d.metadata.data_in_corner, DataInCorner::Unknown);
    assert_eq!(d.sequence, None);
}

#[test]
fn rejects_bad_files() {
    let hint = InferenceHint::default();
    let codec = LedsCodec::default();
    assert!(codec.decode(b"# Height: 2\n", &hint).is_err());
    assert!(codec.decode(b"# Width: 2\n# Height: 2\nhello\n", &hint).is_err());
    assert!(
        codec
            .decode(b"# Width: 2\n# Height: 2\nPattern1: Frame1, moveLeft1, NULL, NULL\n", &hint)
            .is_err()
    );
    assert!(
        codec
            .decode(b"# Width: 2\n# Height: 2\nPattern1: NULL, moveLeft1, NULL, NULL, 1\n", &hint)
            .is_err()
    );
    assert!(
        codec
            .decode(b"# Width: 1\n# Height: 1\n# Frames: 2\nData:\nFFFFFF\n", &hint)
            .is_err()
    );

    let err = codec
        .decode(b"# Version: 2\n# Width: 1\n# Height: 1\n", &hint)
        .unwrap_err();
    assert!(matches!(
        err,
        LmsError::Codec(CodecError::UnsupportedVersion { found: 2, max: 1, .. })
    ));

    let err = codec
        .decode(b"# Width: 1\n# Height: 1\nPattern1: Frame1, spin, NULL, NULL, 1\n", &hint)
        .unwrap_err();
    assert!(err.to_string().contains("unknown action"));
}

#[test]
fn encode_rejects_unwritable_slots() {
    let m = PatternMetadata::without_wiring(1, 1, 0);
    let seq: InstructionSequence = [PatternInstruction::new(
        LayerBinding::new("Frame,1"),
        Instruction::simple(ActionCode::Invert, 1, 0).unwrap(),
    )]
    .into_iter()
    .collect();
    assert!(LedsCodec::default().encode(&m, Some(&seq), None).is_err());
}

#[test]
fn empty_queue_and_empty_frames_survive_a_round_trip() {
    let codec = LedsCodec::default();
    let hint = InferenceHint::default();
    let m = rich_metadata();

    let empty = InstructionSequence::new();
    let bytes = codec.encode(&m, Some(&empty), None).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("# Instructions: 0\n"));
    let d = codec.decode(&bytes, &hint).unwrap();
    assert_eq!(d.sequence, Some(empty));
    assert_eq!(d.frames, None);

    let bare = PatternMetadata::without_wiring(2, 2, 0);
    let no_frames: Vec<Frame> = Vec::new();
    let bytes = codec.encode(&bare, None, Some(no_frames.as_slice())).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.ends_with("Data:\n"));
    assert!(!text.contains("# Instructions"));
    let d = codec.decode(&bytes, &hint).unwrap();
    assert_eq!(d.frames, Some(Vec::new()));
    assert_eq!(d.metadata.frame_count, 0);
    assert_eq!(d.sequence, None);

    let bytes = codec.encode(&bare, None, None).unwrap();
    assert_eq!(codec.decode(&bytes, &hint).unwrap().frames, None);
}

#[test]
fn instruction_count_must_match_lines() {
    let err = LedsCodec::default()
        .decode(
            b"# Width: 1\n# Height: 1\n# Instructions: 2\nPattern1: Frame1, invert, NULL, NULL, 1\n",
            &InferenceHint::default(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("Instructions declares 2"));
}

#[test]
fn unknown_wiring_writes_no_serpentine_flag() {
    let m = PatternMetadata::without_wiring(2, 1, 0);
    let text = String::from_utf8(LedsCodec::default().encode(&m, None, None).unwrap()).unwrap();
    assert!(!text.contains("Serpentine"));
    let d = LedsCodec::default()
        .decode(text.as_bytes(), &InferenceHint::default())
        .unwrap();
    assert_eq!(d.metadata.wiring, WiringMode::Unknown);
}

#[test]
fn names_must_survive_the_name_line() {
    let m = PatternMetadata::without_wiring(1, 1, 0);
    for bad in ["", "   ", "  padded", "trailing ", "two\nlines"] {
        assert!(LedsCodec::with_name(bad).encode(&m, None, None).is_err(), "{bad:?}");
    }
    let bytes = LedsCodec::with_name("inner  spaces").encode(&m, None, None).unwrap();
    let d = LedsCodec::default()
        .decode(&bytes, &InferenceHint::default())
        .unwrap();
    assert_eq!(d.name.as_deref(), Some("inner  spaces"));
}
