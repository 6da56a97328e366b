use super::*;

fn pts(points: &[Point]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.x, p.y)).collect()
}

#[test]
fn single_pixel_traces_a_unit_square() {
    let mask = AlphaMask::from_ascii(&["...", ".#.", "..."]).unwrap();
    let points = trace_contour(&mask).unwrap();
    assert_eq!(
        pts(&points),
        vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]
    );
}

#[test]
fn straight_runs_collapse_to_corners() {
    let mask = AlphaMask::from_ascii(&["##", "##"]).unwrap();
    let points = trace_contour(&mask).unwrap();
    assert_eq!(
        pts(&points),
        vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]
    );
}

#[test]
fn concave_shape_keeps_inner_corner() {
    let mask = AlphaMask::from_ascii(&["#.", "##"]).unwrap();
    let points = trace_contour(&mask).unwrap();
    assert_eq!(
        pts(&points),
        vec![
            (0.0, 0.0),
            (0.0, 2.0),
            (2.0, 2.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 0.0)
        ]
    );
}

#[test]
fn threshold_is_strictly_above_twenty() {
    let faint = AlphaMask::new(1, 1, vec![ALPHA_THRESHOLD]).unwrap();
    assert!(!faint.is_opaque(0, 0));
    assert!(trace_contour(&faint).is_err());

    let visible = AlphaMask::new(1, 1, vec![ALPHA_THRESHOLD + 1]).unwrap();
    assert!(visible.is_opaque(0, 0));
    assert!(!visible.is_opaque(-1, 0));
    assert!(!visible.is_opaque(1, 0));
    assert_eq!(trace_contour(&visible).unwrap().len(), 4);
}

#[test]
fn transparent_mask_is_a_geometry_error() {
    let mask = AlphaMask::from_ascii(&["....", "...."]).unwrap();
    let err = trace_contour(&mask).unwrap_err();
    assert!(matches!(err, EdgeFxError::Geometry(_)));
}

#[test]
fn mask_size_must_match_data() {
    assert!(AlphaMask::new(2, 2, vec![0; 3]).is_err());
    assert!(AlphaMask::from_ascii(&["##", "#"]).is_err());
}

#[test]
fn decodes_alpha_from_an_rgba_image() {
    let mut img = image::RgbaImage::new(3, 2);
    img.put_pixel(2, 1, image::Rgba([10, 20, 30, 255]));
    let mask = AlphaMask::from_image(&image::DynamicImage::ImageRgba8(img)).unwrap();
    assert_eq!((mask.width(), mask.height()), (3, 2));
    assert!(mask.is_opaque(2, 1));
    assert!(!mask.is_opaque(0, 0));
}
