use super::*;
use crate::sequencer::StageConcurrency;

#[test]
fn empty_json_yields_documented_defaults() {
    let o = Options::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(o.presentation.mode, PresentationMode::Showcase);
    assert_eq!(o.presentation.duration, Millis(3000));
    assert_eq!(o.presentation.delay, Millis(2000));
    assert_eq!(o.stroke.color, "#000");
    assert_eq!(o.stroke.width, 2.0);
    assert_eq!(o.stroke.opacity, Opacity::Random);
    assert_eq!(o.stroke.pattern, DashPattern::Solid);
    assert_eq!(o.animation.delay, Millis::ZERO);
    assert_eq!(o.animation.duration, Millis(1000));
    assert_eq!(o.animation.interval, Interval::Random);
    assert_eq!(
        o.filter.features,
        vec![Feature::Background, Feature::Border, Feature::Image]
    );
    assert_eq!(o.effects, vec![EffectConfig::Stroke]);
    assert_eq!(o.sequencer.concurrency, StageConcurrency::Sequential);
}

#[test]
fn tagged_variants_parse() {
    let json = r#"{
        "presentation": {"mode": "fadein", "delay": 0},
        "stroke": {"opacity": {"fixed": 0.4}, "pattern": "5px 3px"},
        "animation": {"interval": {"fixed": 250}, "parallel": false},
        "effects": [{"kind": "stroke"}, {"kind": "ripple", "waves": 3}]
    }"#;
    let o = Options::from_reader(json.as_bytes()).unwrap();
    assert_eq!(o.presentation.mode, PresentationMode::Fadein);
    assert_eq!(o.presentation.duration, Millis(3000));
    assert_eq!(o.stroke.opacity, Opacity::Fixed(0.4));
    assert_eq!(o.stroke.pattern, DashPattern::Custom { dash: 5.0, gap: 3.0 });
    assert_eq!(o.animation.interval, Interval::Fixed(Millis(250)));
    assert!(!o.animation.parallel);
    match &o.effects[1] {
        EffectConfig::Ripple(r) => {
            assert_eq!(r.waves, 3);
            assert_eq!(r.pixels, 10.0);
            assert_eq!(r.interval, Millis(500));
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn opacity_and_interval_accept_bare_numbers_and_keywords() {
    let json = r#"{"stroke": {"opacity": 0.5}, "animation": {"interval": 300}}"#;
    let o = Options::from_reader(json.as_bytes()).unwrap();
    assert_eq!(o.stroke.opacity, Opacity::Fixed(0.5));
    assert_eq!(o.animation.interval, Interval::Fixed(Millis(300)));

    let json = r#"{"stroke": {"opacity": " Random "}, "animation": {"interval": "random"}}"#;
    let o = Options::from_reader(json.as_bytes()).unwrap();
    assert_eq!(o.stroke.opacity, Opacity::Random);
    assert_eq!(o.animation.interval, Interval::Random);

    let json = r#"{"stroke": {"opacity": "0.25"}, "animation": {"interval": "40"}}"#;
    let o = Options::from_reader(json.as_bytes()).unwrap();
    assert_eq!(o.stroke.opacity, Opacity::Fixed(0.25));
    assert_eq!(o.animation.interval, Interval::Fixed(Millis(40)));

    for json in [
        r#"{"stroke": {"opacity": "sometimes"}}"#,
        r#"{"animation": {"interval": -5}}"#,
        r#"{"stroke": {"opacity": 2}}"#,
    ] {
        assert!(Options::from_reader(json.as_bytes()).is_err(), "{json}");
    }
}

#[test]
fn choices_serialize_as_plain_values() {
    assert_eq!(serde_json::to_string(&Opacity::Fixed(0.5)).unwrap(), "0.5");
    assert_eq!(serde_json::to_string(&Opacity::Random).unwrap(), r#""random""#);
    assert_eq!(serde_json::to_string(&Interval::Fixed(Millis(120))).unwrap(), "120");
    let back: Interval = serde_json::from_str("120").unwrap();
    assert_eq!(back, Interval::Fixed(Millis(120)));
}

#[test]
fn empty_effect_list_falls_back_to_stroke() {
    let o = Options::from_reader(r#"{"effects": []}"#.as_bytes()).unwrap();
    assert_eq!(o.effects, vec![EffectConfig::Stroke]);
}

#[test]
fn bad_values_are_rejected_before_a_run() {
    for json in [
        r#"{"stroke": {"width": -1}}"#,
        r#"{"stroke": {"opacity": {"fixed": 1.5}}}"#,
        r#"{"stroke": {"color": " "}}"#,
        r#"{"effects": [{"kind": "ripple", "waves": 0}]}"#,
        r#"{"effects": [{"kind": "sparkle"}]}"#,
        r#"{"presentation": {"mode": "loud"}}"#,
    ] {
        let err = Options::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, EdgeFxError::Validation(_)), "{json}: {err}");
    }
}

#[test]
fn random_picks_stay_in_range_and_follow_the_seed() {
    let mut a = Rng64::new(9);
    let mut b = Rng64::new(9);
    for _ in 0..200 {
        let o = Opacity::Random.resolve(&mut a);
        assert!((0.10..=0.90).contains(&o));
        let i = Interval::Random.resolve(&mut a);
        assert!(i >= Interval::RANDOM_MIN && i <= Interval::RANDOM_MAX);
        assert_eq!(o, Opacity::Random.resolve(&mut b));
        assert_eq!(i, Interval::Random.resolve(&mut b));
    }
    assert_eq!(Opacity::Fixed(0.3).resolve(&mut a), 0.3);
    assert_eq!(Interval::Fixed(Millis(7)).resolve(&mut a), Millis(7));
}
