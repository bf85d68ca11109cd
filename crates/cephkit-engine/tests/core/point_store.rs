use cephkit_core::ViewportPolicy;
use cephkit_engine::model::{CanvasPoint, Point, Size};
use cephkit_engine::point_store::{LandmarkPoint, PointStore};
use cephkit_engine::viewport::CoordinateMapper;

fn identity_mapper() -> CoordinateMapper {
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(500.0, 500.0), Size::new(500.0, 500.0)).unwrap();
    mapper
}

#[test]
fn test_hit_radius_boundary() {
    let mapper = identity_mapper();
    let mut store = PointStore::new();
    store.insert("N", Point::new(100.0, 100.0));

    assert_eq!(
        store.hit_test(&CanvasPoint::new(115.0, 100.0), &mapper, 15.0),
        Some("N".to_string())
    );
    assert_eq!(store.hit_test(&CanvasPoint::new(116.0, 100.0), &mapper, 15.0), None);
}

#[test]
fn test_hit_radius_is_in_canvas_pixels() {
    // Image drawn at half size: 15 canvas px is 30 image px
    let mut mapper = CoordinateMapper::new(ViewportPolicy::FitOnly);
    mapper.init(Size::new(1000.0, 1000.0), Size::new(500.0, 500.0)).unwrap();
    let mut store = PointStore::new();
    store.insert("S", Point::new(200.0, 200.0));

    assert!(store.hit_test(&CanvasPoint::new(115.0, 100.0), &mapper, 15.0).is_some());
    assert!(store.hit_test(&CanvasPoint::new(116.0, 100.0), &mapper, 15.0).is_none());
}

#[test]
fn test_hit_prefers_nearest_then_latest() {
    let mapper = identity_mapper();
    let mut store = PointStore::new();
    store.insert("A", Point::new(100.0, 100.0));
    store.insert("B", Point::new(110.0, 100.0));
    store.insert("C", Point::new(110.0, 100.0));

    assert_eq!(store.hit_test(&CanvasPoint::new(101.0, 100.0), &mapper, 15.0), Some("A".into()));
    assert_eq!(store.hit_test(&CanvasPoint::new(110.0, 100.0), &mapper, 15.0), Some("C".into()));
}

#[test]
fn test_drag_keeps_grab_offset() {
    let mapper = identity_mapper();
    let mut store = PointStore::new();
    store.insert("Go", Point::new(100.0, 100.0));

    assert!(store.begin_drag("Go", &CanvasPoint::new(105.0, 98.0), &mapper));
    assert_eq!(store.selected(), Some("Go"));
    let (id, p) = store.drag_to(&CanvasPoint::new(205.0, 148.0), &mapper).unwrap();
    assert_eq!(id, "Go");
    assert_eq!(p, Point::new(200.0, 150.0));

    assert!(store.end_drag());
    assert!(store.drag_to(&CanvasPoint::new(0.0, 0.0), &mapper).is_none());
    assert_eq!(store.get("Go"), Some(Point::new(200.0, 150.0)));
}

#[test]
fn test_history_survives_drag() {
    let mapper = identity_mapper();
    let mut store = PointStore::new();
    store.insert("S", Point::new(10.0, 10.0));
    store.insert("N", Point::new(50.0, 10.0));
    store.begin_drag("S", &CanvasPoint::new(10.0, 10.0), &mapper);
    store.drag_to(&CanvasPoint::new(30.0, 30.0), &mapper);
    store.end_drag();

    assert_eq!(store.remove_last().map(|(id, _)| id), Some("N".to_string()));
    assert_eq!(store.remove_last().map(|(id, _)| id), Some("S".to_string()));
    assert!(store.remove_last().is_none());
}

#[test]
fn test_remove_selected() {
    let mut store = PointStore::new();
    store.insert("A", Point::new(1.0, 1.0));
    store.insert("B", Point::new(2.0, 2.0));
    assert!(store.remove_selected().is_none());
    assert!(store.select("A"));
    assert!(!store.select("Z"));
    let (id, _) = store.remove_selected().unwrap();
    assert_eq!(id, "A");
    assert_eq!(store.history(), ["B".to_string()]);
}

#[test]
fn test_ordered_round_trip() {
    let mut store = PointStore::new();
    store.insert("Me", Point::new(3.0, 4.0));
    store.insert("Go", Point::new(1.0, 2.0));
    store.insert("Ar", Point::new(5.0, 6.0));

    let ordered = store.to_ordered();
    assert_eq!(
        ordered.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["Me", "Go", "Ar"]
    );
    let rebuilt = PointStore::from_ordered(&ordered).unwrap();
    assert_eq!(rebuilt.last_added(), Some("Ar"));
    assert_eq!(rebuilt.get("Go"), Some(Point::new(1.0, 2.0)));

    let json = serde_json::to_string(&ordered).unwrap();
    let back: Vec<LandmarkPoint> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ordered);
}
