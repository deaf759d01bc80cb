use super::*;
use crate::foundation::core::Rgb;

fn meta(w: u32, h: u32) -> PatternMetadata {
    PatternMetadata::without_wiring(w, h, 0)
}

#[test]
fn new_syncs_frame_count_and_validates() {
    let frames = vec![Frame::solid(6, Rgb::WHITE, 20); 3];
    let p = Pattern::new("p", meta(3, 2), frames);
    assert_eq!(p.metadata.frame_count, 3);
    assert_eq!(p.led_count(), 6);
    assert_eq!(p.duration_ms(), 60);
    p.validate().unwrap();
}

#[test]
fn validate_rejects_wrong_frame_shape() {
    let p = Pattern::new(
        "p",
        meta(4, 4),
        vec![Frame::solid(16, Rgb::BLACK, 20), Frame::solid(15, Rgb::BLACK, 20)],
    );
    let err = p.validate().unwrap_err();
    assert!(err.to_string().contains("frame 1 has 15 LEDs"));
}

#[test]
fn validate_rejects_zero_dims_and_count_mismatch() {
    let p = Pattern::new("p", meta(0, 4), vec![]);
    assert!(p.validate().is_err());

    let mut p = Pattern::new("p", meta(2, 1), vec![Frame::solid(2, Rgb::BLACK, 20)]);
    p.metadata.frame_count = 5;
    assert!(p.validate().unwrap_err().to_string().contains("frame_count 5"));
}

#[test]
fn enum_names_parse_case_insensitively() {
    assert_eq!(ColorOrder::parse("grb").unwrap(), ColorOrder::Grb);
    assert!(ColorOrder::parse("RGBW").is_err());
    assert_eq!(
        WiringMode::parse("Column Serpentine").unwrap(),
        WiringMode::ColumnSerpentine
    );
    assert_eq!(WiringMode::parse("row_major").unwrap(), WiringMode::RowMajor);
    assert_eq!(DataInCorner::parse("rb").unwrap(), DataInCorner::RightBottom);
    for c in ColorOrder::ALL {
        assert_eq!(ColorOrder::parse(c.as_str()).unwrap(), c);
    }
}

#[test]
fn strip_wiring_keeps_dimensions_only() {
    let m = PatternMetadata {
        width: 8,
        height: 4,
        frame_count: 2,
        color_order: ColorOrder::Bgr,
        wiring: WiringMode::Serpentine,
        data_in_corner: DataInCorner::LeftBottom,
    };
    let s = m.strip_wiring();
    assert_eq!(s, PatternMetadata::without_wiring(8, 4, 2));
    assert_eq!(m.wiring.serpentine_flag(), Some(true));
    assert_eq!(s.wiring.serpentine_flag(), None);
}
