//! Scale-aware planar geometry.
//!
//! Every function here is total: zero-length vectors and degenerate lines
//! produce a neutral result (`0.0` or `None`) instead of NaN or a panic.

use crate::model::{CanvasPoint, Point, Vector};
use cephkit_core::constants::UNCALIBRATED_SCALE;

/// Distance between two image points in millimetres.
///
/// `scale` is in px/mm. A non-positive or non-finite scale yields the raw
/// pixel distance, as does the uncalibrated sentinel.
pub fn distance(p1: &Point, p2: &Point, scale: f64) -> f64 {
    let px = p1.distance_to(p2);
    if scale.is_finite() && scale > 0.0 {
        px / scale
    } else {
        px / UNCALIBRATED_SCALE
    }
}

/// Angle at `vertex` between the rays towards `p1` and `p2`, in degrees.
///
/// Returns `0.0` when either arm has zero length.
pub fn angle(p1: &Point, vertex: &Point, p2: &Point) -> f64 {
    let v1 = *p1 - *vertex;
    let v2 = *p2 - *vertex;
    let m1 = v1.length();
    let m2 = v2.length();
    if m1 <= f64::EPSILON || m2 <= f64::EPSILON {
        return 0.0;
    }
    let cos = (v1.dot(&v2) / (m1 * m2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Orthogonal projection of `point` onto the infinite line through
/// `line_start` and `line_end`.
///
/// Returns `None` for a zero-length line.
pub fn project_point_on_line(point: &Point, line_start: &Point, line_end: &Point) -> Option<Point> {
    let dir = (*line_end - *line_start).normalized()?;
    let t = (*point - *line_start).dot(&dir);
    Some(*line_start + dir.scaled(t))
}

/// Angle between two lines given by their endpoints, in degrees `[0, 180]`.
///
/// Direction matters: the result is the angle between the normalized
/// vectors `a2 - a1` and `b2 - b1`. Returns `None` if either line is
/// degenerate.
pub fn line_angle(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<f64> {
    let u = (*a2 - *a1).normalized()?;
    let v = (*b2 - *b1).normalized()?;
    Some(u.dot(&v).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Signed distance between the feet of `a` and `b` on a reference line,
/// measured along the line direction, in millimetres.
///
/// Positive when the foot of `a` lies further along the line than the foot
/// of `b`.
pub fn projected_distance(
    a: &Point,
    b: &Point,
    line_start: &Point,
    line_end: &Point,
    scale: f64,
) -> Option<f64> {
    let dir = (*line_end - *line_start).normalized()?;
    let fa = (*a - *line_start).dot(&dir);
    let fb = (*b - *line_start).dot(&dir);
    let px = fa - fb;
    if scale.is_finite() && scale > 0.0 {
        Some(px / scale)
    } else {
        Some(px)
    }
}

/// Spherical linear interpolation between two unit vectors.
///
/// Falls back to the first vector when the two are parallel.
pub fn slerp(u: &Vector, v: &Vector, t: f64) -> Vector {
    let omega = u.dot(v).clamp(-1.0, 1.0).acos();
    let sin_omega = omega.sin();
    if sin_omega.abs() < 1e-9 {
        return *u;
    }
    let a = ((1.0 - t) * omega).sin() / sin_omega;
    let b = (t * omega).sin() / sin_omega;
    Vector::new(a * u.x + b * v.x, a * u.y + b * v.y)
}

/// Polyline approximating the arc of the angle at `vertex`, in canvas space.
///
/// The arc sweeps the smaller angle between the arms. For anti-parallel
/// arms slerp is undefined, so the sweep is rotated explicitly, turning in
/// the direction given by the sign of the cross product of the arms.
/// Returns an empty list if either arm is degenerate.
pub fn angle_arc(
    arm1: &CanvasPoint,
    vertex: &CanvasPoint,
    arm2: &CanvasPoint,
    radius: f64,
    segments: usize,
) -> Vec<CanvasPoint> {
    let v1 = Vector::new(arm1.x - vertex.x, arm1.y - vertex.y);
    let v2 = Vector::new(arm2.x - vertex.x, arm2.y - vertex.y);
    let (Some(u), Some(v)) = (v1.normalized(), v2.normalized()) else {
        return Vec::new();
    };
    let segments = segments.max(1);
    let cross = u.cross(&v);
    let antiparallel = u.dot(&v) < -1.0 + 1e-9;

    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let dir = if antiparallel {
                let sign = if cross < 0.0 { -1.0 } else { 1.0 };
                let theta = sign * std::f64::consts::PI * t;
                let (s, c) = theta.sin_cos();
                Vector::new(u.x * c - u.y * s, u.x * s + u.y * c)
            } else {
                slerp(&u, &v, t)
            };
            CanvasPoint::new(vertex.x + dir.x * radius, vertex.y + dir.y * radius)
        })
        .collect()
}
