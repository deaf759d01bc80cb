use super::*;
use serde_json::json;

fn map(v: serde_json::Value) -> ParamMap {
    v.as_object().cloned().unwrap()
}

#[test]
fn codes_parse_case_insensitively_and_round_trip() {
    for a in ActionCode::ALL {
        assert_eq!(ActionCode::parse(a.code()).unwrap(), a);
        assert_eq!(a.to_string(), a.code());
    }
    assert_eq!("MOVELEFT1".parse::<ActionCode>().unwrap(), ActionCode::MoveLeft1);
    assert_eq!(
        ActionCode::parse("wobble").unwrap_err(),
        ValidationError::UnknownAction("wobble".to_string())
    );
}

#[test]
fn serde_uses_legacy_codes() {
    let s = serde_json::to_string(&ActionCode::MirrorH).unwrap();
    assert_eq!(s, "\"mirrorH\"");
    let a: ActionCode = serde_json::from_str("\"scrollText\"").unwrap();
    assert_eq!(a, ActionCode::ScrollText);
}

#[test]
fn rotate_requires_turns() {
    let err = parse_action_params(ActionCode::Rotate90, &ParamMap::new()).unwrap_err();
    assert!(matches!(err, ValidationError::MissingParam { ref param, .. } if param == "turns"));

    let p = parse_action_params(ActionCode::Rotate90, &map(json!({ "turns": -1 }))).unwrap();
    assert_eq!(p, ActionParams::Rotate(RotateParams { turns: -1 }));
    let ActionParams::Rotate(r) = p else {
        panic!("expected rotate")
    };
    assert_eq!(r.normalized(), 3);

    let err = parse_action_params(ActionCode::Rotate90, &map(json!({ "turns": "two" }))).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidParam { .. }));
}

#[test]
fn scroll_text_defaults_and_requirements() {
    let err = parse_action_params(ActionCode::ScrollText, &ParamMap::new()).unwrap_err();
    assert!(matches!(err, ValidationError::MissingParam { ref param, .. } if param == "text"));

    let p = parse_action_params(ActionCode::ScrollText, &map(json!({ "text": "HI" }))).unwrap();
    assert_eq!(
        p,
        ActionParams::ScrollText(ScrollTextParams {
            text: "HI".to_string(),
            speed: 1,
            color: Rgb::WHITE,
        })
    );

    let p = parse_action_params(
        ActionCode::ScrollText,
        &map(json!({ "text": "A", "speed": 2, "color": "#FF0000", "font": "5x7" })),
    )
    .unwrap();
    let ActionParams::ScrollText(s) = p else {
        panic!("expected scroll text")
    };
    assert_eq!(s.speed, 2);
    assert_eq!(s.color, Rgb::new(255, 0, 0));

    let err =
        parse_action_params(ActionCode::ScrollText, &map(json!({ "text": "A", "speed": 0 })))
            .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidParam { ref param, .. } if param == "speed"));
}

#[test]
fn fade_randomize_brightness_ranges() {
    assert_eq!(
        parse_action_params(ActionCode::Fade, &ParamMap::new()).unwrap(),
        ActionParams::Fade(FadeParams { strength: 255 })
    );
    assert!(parse_action_params(ActionCode::Fade, &map(json!({ "strength": 300 }))).is_err());
    assert_eq!(
        parse_action_params(ActionCode::Randomize, &map(json!({ "seed": 7, "strength": 10 })))
            .unwrap(),
        ActionParams::Randomize(RandomizeParams {
            seed: 7,
            strength: 10
        })
    );
    assert!(parse_action_params(ActionCode::Randomize, &map(json!({ "seed": -1 }))).is_err());
    assert_eq!(
        parse_action_params(ActionCode::Brightness, &map(json!({ "delta": -40 }))).unwrap(),
        ActionParams::Brightness(BrightnessParams { delta: -40 })
    );
}

#[test]
fn parameterless_actions_ignore_extra_keys() {
    let p = parse_action_params(ActionCode::MoveLeft1, &map(json!({ "direction": "reverse" })))
        .unwrap();
    assert_eq!(p, ActionParams::None);
}
