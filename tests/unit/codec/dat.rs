use super::*;
use crate::foundation::core::Rgb;

#[test]
fn round_trip() {
    let m = PatternMetadata::without_wiring(2, 2, 2);
    let f = vec![
        Frame::new(vec![Rgb::WHITE, Rgb::BLACK, Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)], 20),
        Frame::solid(4, Rgb::new(0x12, 0x34, 0x56), 100),
    ];
    let bytes = DatCodec.encode(&m, None, Some(&f)).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.starts_with("2 2\n2\nFFFFFF 000000 010203 040506 @20\n"));

    let d = DatCodec.decode(&bytes, &InferenceHint::default()).unwrap();
    assert_eq!(d.metadata, m);
    assert_eq!(d.frames.unwrap(), f);
}

#[test]
fn legacy_rows_without_durations() {
    let d = DatCodec
        .decode(b"3 1\n1\nFF0000 00FF00 0000FF\n", &InferenceHint::default())
        .unwrap();
    assert_eq!(d.metadata.width, 3);
    assert_eq!(d.frames.unwrap()[0].duration_ms, 20);
}

#[test]
fn header_errors() {
    let hint = InferenceHint::default();
    assert!(DatCodec.decode(b"", &hint).is_err());
    assert!(DatCodec.decode(b"0 4\n1\n", &hint).is_err());
    assert!(DatCodec.decode(b"2 2\n-1\n", &hint).is_err());
    assert!(DatCodec.decode(b"2\n1\nFFFFFF FFFFFF\n", &hint).is_err());
    let err = DatCodec
        .decode(b"1 1\n2\nFFFFFF\n", &hint)
        .unwrap_err();
    assert!(err.to_string().contains("declares 2 frames, found 1"));
}
