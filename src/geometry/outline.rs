use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::{Arc, ParamCurveArclen, Shape as _};

use crate::{
    foundation::{
        core::{Affine, BezPath, Point, Rect, Vec2},
        error::{EdgeFxError, EdgeFxResult},
    },
    geometry::contour::{AlphaMask, trace_contour},
};

/// Accuracy passed to `arclen` when measuring outlines.
pub const ARCLEN_ACCURACY: f64 = 1e-3;

const ARC_TOLERANCE: f64 = 0.01;

/// Border radii in px, clockwise from the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadii {
    pub fn uniform(r: f64) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub fn is_zero(&self) -> bool {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
        .iter()
        .all(|r| *r <= 0.0)
    }

    /// Clamps each radius into `[0, max]`; non-finite radii become zero.
    pub fn clamped(self, max: f64) -> Self {
        let c = |r: f64| if r.is_finite() { r.clamp(0.0, max.max(0.0)) } else { 0.0 };
        Self {
            top_left: c(self.top_left),
            top_right: c(self.top_right),
            bottom_right: c(self.bottom_right),
            bottom_left: c(self.bottom_left),
        }
    }
}

/// A closed path traced around an element, in surface-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    path: BezPath,
    length: f64,
    bounds: Rect,
}

impl Outline {
    fn from_path(path: BezPath) -> EdgeFxResult<Self> {
        let length: f64 = path.segments().map(|s| s.arclen(ARCLEN_ACCURACY)).sum();
        if !length.is_finite() || length <= 0.0 {
            return Err(EdgeFxError::geometry("outline has no length"));
        }
        let bounds = path.bounding_box();
        Ok(Self {
            path,
            length,
            bounds,
        })
    }

    /// A `width` x `height` box whose top-left corner sits at `(offset, offset)`.
    pub fn rect(width: f64, height: f64, offset: f64) -> EdgeFxResult<Self> {
        Self::rounded(width, height, CornerRadii::default(), offset)
    }

    /// Box with circular corners. The path starts on the top edge and runs down the left
    /// side first.
    pub fn rounded(
        width: f64,
        height: f64,
        radii: CornerRadii,
        offset: f64,
    ) -> EdgeFxResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(EdgeFxError::geometry(format!(
                "cannot outline a {width}x{height} box"
            )));
        }
        let r = radii.clamped(width.min(height) / 2.0);
        let (x, y) = (offset, offset);
        let (w, h) = (width, height);

        let mut path = BezPath::new();
        path.move_to((x + r.top_left, y));
        corner(&mut path, Point::new(x + r.top_left, y + r.top_left), r.top_left, -FRAC_PI_2);
        path.line_to((x, y + h - r.bottom_left));
        corner(
            &mut path,
            Point::new(x + r.bottom_left, y + h - r.bottom_left),
            r.bottom_left,
            PI,
        );
        path.line_to((x + w - r.bottom_right, y + h));
        corner(
            &mut path,
            Point::new(x + w - r.bottom_right, y + h - r.bottom_right),
            r.bottom_right,
            FRAC_PI_2,
        );
        path.line_to((x + w, y + r.top_right));
        corner(
            &mut path,
            Point::new(x + w - r.top_right, y + r.top_right),
            r.top_right,
            0.0,
        );
        path.line_to((x + r.top_left, y));
        path.close_path();
        Self::from_path(path)
    }

    /// Polygon through `points`, each scaled by `scale` then moved by `offset`.
    pub fn polygon(points: &[Point], scale: Vec2, offset: Vec2) -> EdgeFxResult<Self> {
        if points.len() < 3 {
            return Err(EdgeFxError::geometry(format!(
                "contour needs at least 3 points, got {}",
                points.len()
            )));
        }
        let map = |p: Point| Point::new(p.x * scale.x, p.y * scale.y) + offset;
        let mut path = BezPath::new();
        path.move_to(map(points[0]));
        for p in &points[1..] {
            path.line_to(map(*p));
        }
        path.close_path();
        Self::from_path(path)
    }

    /// Traces `mask` and stretches the contour to a `width` x `height` element.
    pub fn from_mask(mask: &AlphaMask, width: f64, height: f64, offset: f64) -> EdgeFxResult<Self> {
        let points = trace_contour(mask)?;
        let scale = Vec2::new(
            width / f64::from(mask.width().max(1)),
            height / f64::from(mask.height().max(1)),
        );
        tracing::trace!(points = points.len(), ?scale, "traced alpha contour");
        Self::polygon(&points, scale, Vec2::new(offset, offset))
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn to_svg(&self) -> String {
        self.path.to_svg()
    }

    /// Per-axis factor that grows the outline's bounds by `grow` px on each axis.
    pub fn grow_scale(&self, grow: f64) -> Vec2 {
        let b = self.bounds;
        let axis = |extent: f64| if extent > 0.0 { (extent + grow) / extent } else { 1.0 };
        Vec2::new(axis(b.width()), axis(b.height()))
    }

    /// Copy transformed by `affine`; the length is re-measured.
    pub fn transformed(&self, affine: Affine) -> EdgeFxResult<Self> {
        Self::from_path(affine * self.path.clone())
    }
}

/// Quarter arc of radius `r` sweeping counter-clockwise (screen space) from `start`.
fn corner(path: &mut BezPath, center: Point, r: f64, start: f64) {
    if r <= 0.0 {
        return;
    }
    let arc = Arc {
        center,
        radii: Vec2::new(r, r),
        start_angle: start,
        sweep_angle: -FRAC_PI_2,
        x_rotation: 0.0,
    };
    path.extend(arc.append_iter(ARC_TOLERANCE));
}

/// The rectangle a drawing surface covers: the element grown by `stroke_width` on every side.
pub fn surface_frame(element: Rect, stroke_width: f64) -> Rect {
    element.inflate(stroke_width, stroke_width)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/outline.rs"]
mod tests;
