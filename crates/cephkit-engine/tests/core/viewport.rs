use cephkit_core::{InputError, ViewportPolicy};
use cephkit_engine::model::{CanvasPoint, Point, Size};
use cephkit_engine::viewport::{CoordinateMapper, FitTransform};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_letterbox_wide_image() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(1000.0, 500.0), Size::new(500.0, 500.0)).unwrap();
    let fit = mapper.fit();
    assert!(close(fit.scale, 0.5));
    assert!(close(fit.offset_x, 0.0));
    assert!(close(fit.offset_y, 125.0));
}

#[test]
fn test_letterbox_tall_image() {
    let fit = FitTransform::letterbox(Size::new(200.0, 400.0), Size::new(800.0, 400.0));
    assert!(close(fit.scale, 1.0));
    assert!(close(fit.offset_x, 300.0));
    assert!(close(fit.offset_y, 0.0));
}

#[test]
fn test_invalid_sizes_leave_state_unchanged() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(100.0, 100.0), Size::new(200.0, 200.0)).unwrap();
    let before = mapper.fit();

    let err = mapper.init(Size::new(0.0, 100.0), Size::new(200.0, 200.0)).unwrap_err();
    assert!(matches!(err, InputError::InvalidRaster { .. }));
    assert!(mapper.init(Size::new(f64::NAN, 100.0), Size::new(200.0, 200.0)).is_err());
    assert!(mapper.set_canvas_size(Size::new(-1.0, 10.0)).is_err());

    assert_eq!(mapper.fit(), before);
    assert_eq!(mapper.image_size(), Some(Size::new(100.0, 100.0)));
}

#[test]
fn test_canvas_resize_refits() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(100.0, 100.0), Size::new(100.0, 100.0)).unwrap();
    let p = Point::new(40.0, 60.0);
    assert_eq!(mapper.to_canvas_space(&p), CanvasPoint::new(40.0, 60.0));

    mapper.set_canvas_size(Size::new(300.0, 200.0)).unwrap();
    let c = mapper.to_canvas_space(&p);
    assert!(close(c.x, 50.0 + 80.0));
    assert!(close(c.y, 120.0));
    // Stored image coordinates are unaffected by the resize
    let back = mapper.to_image_space(&c);
    assert!(close(back.x, 40.0) && close(back.y, 60.0));
}

#[test]
fn test_fit_only_ignores_user_zoom() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(100.0, 100.0), Size::new(100.0, 100.0)).unwrap();
    assert!(!mapper.zoom_in());
    assert!(!mapper.pan_by(10.0, 10.0));
    assert!(!mapper.reset_view());
    assert!(mapper.view().is_identity());
}

#[test]
fn test_user_zoom_about_canvas_centre() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitWithUserZoom);
    mapper.init(Size::new(100.0, 100.0), Size::new(100.0, 100.0)).unwrap();
    assert!(mapper.set_zoom(2.0));
    // The canvas centre is a fixed point of the zoom
    let centre = mapper.to_canvas_space(&Point::new(50.0, 50.0));
    assert!(close(centre.x, 50.0) && close(centre.y, 50.0));
    let corner = mapper.to_canvas_space(&Point::new(0.0, 0.0));
    assert!(close(corner.x, -50.0) && close(corner.y, -50.0));
    assert!(close(mapper.effective_scale(), 2.0));
}

#[test]
fn test_zoom_is_clamped() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitWithUserZoom);
    mapper.init(Size::new(100.0, 100.0), Size::new(100.0, 100.0)).unwrap();
    for _ in 0..50 {
        mapper.zoom_in();
    }
    assert!(close(mapper.view().zoom, 5.0));
    for _ in 0..50 {
        mapper.zoom_out();
    }
    assert!(close(mapper.view().zoom, 0.2));
    assert!(mapper.reset_view());
    assert!(mapper.view().is_identity());
}

#[test]
fn test_image_swap_resets_view() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitWithUserZoom);
    mapper.init(Size::new(100.0, 100.0), Size::new(100.0, 100.0)).unwrap();
    mapper.zoom_in();
    mapper.pan_by(5.0, 5.0);
    mapper.set_image_size(Size::new(50.0, 50.0)).unwrap();
    assert!(mapper.view().is_identity());
    assert!(close(mapper.fit().scale, 2.0));
}

#[test]
fn test_contains_canvas_point() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    assert!(!mapper.contains_canvas_point(&CanvasPoint::new(1.0, 1.0)));
    mapper.init(Size::new(1000.0, 500.0), Size::new(500.0, 500.0)).unwrap();
    assert!(mapper.contains_canvas_point(&CanvasPoint::new(250.0, 250.0)));
    assert!(!mapper.contains_canvas_point(&CanvasPoint::new(250.0, 100.0)));
}

#[test]
fn test_magnified_mapper_centres_on_cursor() {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(1000.0, 500.0), Size::new(500.0, 500.0)).unwrap();
    let cursor = CanvasPoint::new(240.0, 260.0);
    let inset = mapper.magnified(&cursor, 2.0, Size::new(200.0, 200.0));

    let under_cursor = mapper.to_image_space(&cursor);
    let c = inset.to_canvas_space(&under_cursor);
    assert!(close(c.x, 100.0) && close(c.y, 100.0));
    assert!(close(inset.effective_scale(), 2.0 * mapper.effective_scale()));
}

proptest! {
    #[test]
    fn prop_round_trip_fit_only(
        iw in 1.0f64..4000.0,
        ih in 1.0f64..4000.0,
        cw in 1.0f64..2000.0,
        ch in 1.0f64..2000.0,
        x in -500.0f64..5000.0,
        y in -500.0f64..5000.0,
    ) {
        let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
        mapper.init(Size::new(iw, ih), Size::new(cw, ch)).unwrap();
        let p = Point::new(x, y);
        let back = mapper.to_image_space(&mapper.to_canvas_space(&p));
        prop_assert!((back.x - x).abs() < 1e-6, "x {} -> {}", x, back.x);
        prop_assert!((back.y - y).abs() < 1e-6, "y {} -> {}", y, back.y);
    }

    #[test]
    fn prop_round_trip_with_user_view(
        iw in 1.0f64..4000.0,
        ih in 1.0f64..4000.0,
        cw in 1.0f64..2000.0,
        ch in 1.0f64..2000.0,
        zoom in 0.2f64..5.0,
        pan_x in -500.0f64..500.0,
        pan_y in -500.0f64..500.0,
        x in -500.0f64..5000.0,
        y in -500.0f64..5000.0,
    ) {
        let mut mapper = CoordinateMapper::new(ViewportPolicy::FitWithUserZoom);
        mapper.init(Size::new(iw, ih), Size::new(cw, ch)).unwrap();
        mapper.set_zoom(zoom);
        mapper.pan_by(pan_x, pan_y);
        let p = Point::new(x, y);
        let back = mapper.to_image_space(&mapper.to_canvas_space(&p));
        prop_assert!((back.x - x).abs() < 1e-6, "x {} -> {}", x, back.x);
        prop_assert!((back.y - y).abs() < 1e-6, "y {} -> {}", y, back.y);

        let c = CanvasPoint::new(x / 3.0, y / 3.0);
        let again = mapper.to_canvas_space(&mapper.to_image_space(&c));
        prop_assert!((again.x - c.x).abs() < 1e-6);
        prop_assert!((again.y - c.y).abs() < 1e-6);
    }
}
