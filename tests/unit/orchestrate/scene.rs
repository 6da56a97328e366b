use super::*;

fn el(id: &str) -> Element {
    Element::new(id, Rect::new(0.0, 0.0, 10.0, 10.0))
}

fn sample() -> Scene {
    let mut bg = el("bg");
    bg.background = true;
    let mut bordered = el("bordered");
    bordered.border_width = 1.0;
    let mut img = el("img");
    img.kind = ElementKind::Image;
    Scene::new(vec![bg, el("plain"), bordered, img]).unwrap()
}

fn ids(scene: &Scene, picked: &[usize]) -> Vec<String> {
    picked.iter().map(|i| scene.elements[*i].id.clone()).collect()
}

#[test]
fn default_filter_keeps_decorated_elements() {
    let scene = sample();
    let picked = scene.select(&FilterOptions::default());
    assert_eq!(ids(&scene, &picked), ["bg", "bordered", "img"]);
}

#[test]
fn empty_feature_list_keeps_everything() {
    let scene = sample();
    let filter = FilterOptions {
        features: vec![],
        ids: vec![],
    };
    assert_eq!(scene.select(&filter).len(), 4);
}

#[test]
fn id_list_narrows_before_features() {
    let scene = sample();
    let filter = FilterOptions {
        features: vec![Feature::Image, Feature::Background],
        ids: vec!["plain".into(), "img".into()],
    };
    assert_eq!(ids(&scene, &scene.select(&filter)), ["img"]);
}

#[test]
fn duplicate_and_empty_ids_are_rejected() {
    assert!(Scene::new(vec![el("a"), el("a")]).is_err());
    assert!(Scene::new(vec![el("")]).is_err());
    let mut nan = el("n");
    nan.rect.x1 = f64::NAN;
    assert!(Scene::new(vec![nan]).is_err());
}

#[test]
fn parses_json_with_defaults() {
    let json = r#"{"elements": [
        {"id": "card", "rect": {"x0": 10, "y0": 20, "x1": 110, "y1": 70},
         "radii": {"top_left": 8}, "background": true,
         "overrides": {"color": "red", "duration": 400, "ease": "sin-in-out"}}
    ]}"#;
    let scene = Scene::from_reader(json.as_bytes()).unwrap();
    let card = scene.get("card").unwrap();
    assert_eq!(card.kind, ElementKind::Box);
    assert_eq!(card.radii.top_left, 8.0);
    assert_eq!(card.radii.bottom_right, 0.0);
    assert_eq!(card.rect.width(), 100.0);

    let settings = card.overrides.apply(&Options::default());
    assert_eq!(settings.stroke.color, "red");
    assert_eq!(settings.stroke.width, 2.0);
    assert_eq!(settings.animation.duration, Millis(400));
    assert_eq!(settings.animation.interval, Interval::Random);
    assert_eq!(settings.animation.ease, Ease::SinInOut);
}

#[test]
fn invalid_override_width_keeps_the_default() {
    let o = ElementOverrides {
        width: Some(f64::INFINITY),
        ..ElementOverrides::default()
    };
    assert_eq!(o.apply(&Options::default()).stroke.width, 2.0);
}

#[test]
fn out_of_range_overrides_are_rejected_with_the_element_id() {
    let json = r#"{"elements": [
        {"id": "card", "rect": {"x0": 0, "y0": 0, "x1": 10, "y1": 10},
         "overrides": {"opacity": 3.0}}
    ]}"#;
    let err = Scene::from_reader(json.as_bytes()).unwrap_err().to_string();
    assert!(err.contains("card"), "{err}");
    assert!(err.contains("overrides.opacity"), "{err}");

    let mut blank = el("blank");
    blank.overrides.color = Some("  ".into());
    assert!(Scene::new(vec![blank]).is_err());

    let mut negative = el("negative");
    negative.overrides.width = Some(-1.0);
    assert!(Scene::new(vec![negative]).is_err());

    let mut fine = el("fine");
    fine.overrides.opacity = Some(Opacity::Fixed(1.0));
    fine.overrides.width = Some(0.0);
    assert!(Scene::new(vec![fine]).is_ok());
}

#[test]
fn masks_load_relative_to_the_scene_file() {
    let dir = std::env::temp_dir().join(format!("edgefx_scene_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let mut img = image::RgbaImage::new(4, 4);
    img.put_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
    img.save(dir.join("logo.png")).unwrap();
    std::fs::write(
        dir.join("scene.json"),
        r#"{"elements": [{"id": "logo", "kind": "image",
            "rect": {"x0": 0, "y0": 0, "x1": 4, "y1": 4}, "mask_path": "logo.png"}]}"#,
    )
    .unwrap();

    let scene = Scene::from_path(dir.join("scene.json")).unwrap();
    let mask = scene.elements[0].mask.as_ref().unwrap();
    assert_eq!((mask.width(), mask.height()), (4, 4));
    assert!(mask.is_opaque(1, 1));

    std::fs::write(
        dir.join("broken.json"),
        r#"{"elements": [{"id": "x", "rect": {"x0": 0, "y0": 0, "x1": 1, "y1": 1},
            "mask_path": "missing.png"}]}"#,
    )
    .unwrap();
    assert!(Scene::from_path(dir.join("broken.json")).is_err());
}
