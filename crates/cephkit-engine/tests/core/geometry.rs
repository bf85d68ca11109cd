use cephkit_engine::geometry::{angle, angle_arc, distance, line_angle, project_point_on_line, projected_distance};
use cephkit_engine::model::{CanvasPoint, Point};
use proptest::prelude::*;

#[test]
fn test_scaled_distance() {
    let d = distance(&Point::new(0.0, 0.0), &Point::new(30.0, 40.0), 10.0);
    assert!((d - 5.0).abs() < 1e-12);
}

#[test]
fn test_right_angle() {
    let a = angle(&Point::new(1.0, 0.0), &Point::new(0.0, 0.0), &Point::new(0.0, 1.0));
    assert!((a - 90.0).abs() < 1e-9);
}

#[test]
fn test_zero_length_arm() {
    let v = Point::new(3.0, 3.0);
    assert_eq!(angle(&v, &v, &Point::new(5.0, 1.0)), 0.0);
    assert_eq!(angle(&Point::new(5.0, 1.0), &v, &v), 0.0);
}

#[test]
fn test_projection_onto_horizontal_segment() {
    let foot = project_point_on_line(&Point::new(5.0, 7.0), &Point::new(0.0, 0.0), &Point::new(10.0, 0.0)).unwrap();
    assert!((foot.x - 5.0).abs() < 1e-12);
    assert!(foot.y.abs() < 1e-12);
    // The line is infinite, so points beyond the segment still project
    let beyond = project_point_on_line(&Point::new(15.0, -2.0), &Point::new(0.0, 0.0), &Point::new(10.0, 0.0)).unwrap();
    assert!((beyond.x - 15.0).abs() < 1e-12);
}

#[test]
fn test_projection_onto_degenerate_line() {
    let p = Point::new(2.0, 2.0);
    assert!(project_point_on_line(&Point::new(0.0, 0.0), &p, &p).is_none());
}

#[test]
fn test_line_angle_direction() {
    let o = Point::new(0.0, 0.0);
    let x = Point::new(1.0, 0.0);
    let a = line_angle(&o, &x, &o, &Point::new(1.0, 1.0)).unwrap();
    assert!((a - 45.0).abs() < 1e-9);
    let reversed = line_angle(&o, &x, &Point::new(1.0, 1.0), &o).unwrap();
    assert!((reversed - 135.0).abs() < 1e-9);
}

#[test]
fn test_projected_distance_sign() {
    let start = Point::new(0.0, 0.0);
    let end = Point::new(10.0, 0.0);
    let d = projected_distance(&Point::new(8.0, 3.0), &Point::new(2.0, -4.0), &start, &end, 2.0).unwrap();
    assert!((d - 3.0).abs() < 1e-12);
    let d = projected_distance(&Point::new(2.0, 3.0), &Point::new(8.0, -4.0), &start, &end, 2.0).unwrap();
    assert!((d + 3.0).abs() < 1e-12);
}

#[test]
fn test_arc_sweeps_smaller_angle() {
    let v = CanvasPoint::new(0.0, 0.0);
    let arc = angle_arc(&CanvasPoint::new(10.0, 0.0), &v, &CanvasPoint::new(0.0, 10.0), 30.0, 20);
    assert_eq!(arc.len(), 21);
    for p in &arc {
        assert!((p.distance_to(&v) - 30.0).abs() < 1e-9);
        assert!(p.x >= -1e-9 && p.y >= -1e-9);
    }
}

#[test]
fn test_arc_antiparallel_arms() {
    let v = CanvasPoint::new(0.0, 0.0);
    let arc = angle_arc(&CanvasPoint::new(10.0, 0.0), &v, &CanvasPoint::new(-10.0, 0.0), 30.0, 20);
    assert_eq!(arc.len(), 21);
    let last = arc[20];
    assert!((last.x + 30.0).abs() < 1e-9);
    assert!(last.y.abs() < 1e-9);
    // Half-way round is a quarter turn, not the vertex
    assert!((arc[10].distance_to(&v) - 30.0).abs() < 1e-9);
}

#[test]
fn test_arc_degenerate_arm() {
    let v = CanvasPoint::new(4.0, 4.0);
    assert!(angle_arc(&v, &v, &CanvasPoint::new(0.0, 0.0), 30.0, 20).is_empty());
}

proptest! {
    #[test]
    fn prop_angle_is_bounded(
        ax in -1e4f64..1e4, ay in -1e4f64..1e4,
        vx in -1e4f64..1e4, vy in -1e4f64..1e4,
        bx in -1e4f64..1e4, by in -1e4f64..1e4,
    ) {
        let a = angle(&Point::new(ax, ay), &Point::new(vx, vy), &Point::new(bx, by));
        prop_assert!(a.is_finite());
        prop_assert!((0.0..=180.0).contains(&a));
    }
}
