use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

#[test]
fn box_outline_is_inset_by_the_offset() {
    let o = Outline::rect(100.0, 50.0, 2.0).unwrap();
    assert!(approx(o.length(), 300.0));
    assert_eq!(o.bounds(), Rect::new(2.0, 2.0, 102.0, 52.0));
    assert!(o.to_svg().starts_with("M2,2"));
}

#[test]
fn box_path_runs_down_the_left_side_first() {
    let o = Outline::rect(10.0, 20.0, 0.0).unwrap();
    let second = o.path().elements()[1];
    assert_eq!(second, kurbo::PathEl::LineTo(Point::new(0.0, 20.0)));
}

#[test]
fn rounded_corners_shorten_the_perimeter() {
    let r = 10.0;
    let o = Outline::rounded(100.0, 100.0, CornerRadii::uniform(r), 0.0).unwrap();
    let expected = 400.0 - 8.0 * r + 2.0 * std::f64::consts::PI * r;
    assert!(approx(o.length(), expected), "{} vs {expected}", o.length());
    assert!(approx(o.bounds().width(), 100.0));
}

#[test]
fn oversized_radii_are_clamped_to_half_the_short_side() {
    let o = Outline::rounded(40.0, 20.0, CornerRadii::uniform(500.0), 0.0).unwrap();
    let expected = 2.0 * (40.0 - 20.0) + std::f64::consts::PI * 20.0;
    assert!(approx(o.length(), expected), "{}", o.length());
}

#[test]
fn degenerate_boxes_are_rejected() {
    assert!(Outline::rect(0.0, 10.0, 0.0).is_err());
    assert!(Outline::rect(f64::NAN, 10.0, 0.0).is_err());
}

#[test]
fn mask_contour_is_stretched_to_the_element() {
    let mask = AlphaMask::from_ascii(&["##", "##"]).unwrap();
    let o = Outline::from_mask(&mask, 20.0, 10.0, 3.0).unwrap();
    assert_eq!(o.bounds(), Rect::new(3.0, 3.0, 23.0, 13.0));
    assert!(approx(o.length(), 60.0));
}

#[test]
fn polygon_needs_three_points() {
    let two = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert!(Outline::polygon(&two, Vec2::new(1.0, 1.0), Vec2::ZERO).is_err());
}

#[test]
fn grow_scale_adds_pixels_per_axis() {
    let o = Outline::rect(100.0, 50.0, 0.0).unwrap();
    let s = o.grow_scale(20.0);
    assert!(approx(s.x, 1.2));
    assert!(approx(s.y, 1.4));
    let doubled = o.transformed(Affine::scale(2.0)).unwrap();
    assert!(approx(doubled.length(), 600.0));
}

#[test]
fn surface_frame_grows_by_stroke_width() {
    let frame = surface_frame(Rect::new(10.0, 10.0, 30.0, 40.0), 2.0);
    assert_eq!(frame, Rect::new(8.0, 8.0, 32.0, 42.0));
}
