//! Named landmark collection for one projection.
//!
//! Points are stored in image space. An explicit insertion history records
//! the order in which landmarks were first added, so "delete the last point"
//! never depends on container iteration order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{CanvasPoint, Point};
use crate::viewport::CoordinateMapper;

/// A landmark with its image-space coordinate, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Drag in progress on the selected point
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub id: String,
    /// Cursor minus the point's canvas position when the drag started
    pub grab_dx: f64,
    pub grab_dy: f64,
}

/// Landmarks of a single projection, with selection and drag state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointStore {
    points: HashMap<String, Point>,
    history: Vec<String>,
    selected: Option<String>,
    drag: Option<DragState>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Point> {
        self.points.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.points.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.history
            .iter()
            .filter_map(|id| self.points.get(id).map(|p| (id.as_str(), *p)))
    }

    /// Ids in insertion order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Places or moves a landmark.
    ///
    /// Moving an existing landmark keeps its place in the history.
    /// Returns `true` if the landmark was new.
    pub fn insert(&mut self, id: &str, point: Point) -> bool {
        let is_new = self.points.insert(id.to_string(), point).is_none();
        if is_new {
            self.history.push(id.to_string());
        }
        is_new
    }

    /// Removes a landmark, clearing selection and drag if they referenced it.
    pub fn remove(&mut self, id: &str) -> Option<Point> {
        let removed = self.points.remove(id)?;
        self.history.retain(|h| h != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        Some(removed)
    }

    /// Most recently added landmark id.
    pub fn last_added(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Removes the most recently added landmark.
    pub fn remove_last(&mut self) -> Option<(String, Point)> {
        let id = self.history.last()?.clone();
        let point = self.remove(&id)?;
        Some((id, point))
    }

    /// Removes the selected landmark, if any.
    pub fn remove_selected(&mut self) -> Option<(String, Point)> {
        let id = self.selected.clone()?;
        let point = self.remove(&id)?;
        Some((id, point))
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Marks a landmark selected. Returns `false` if the id is unknown.
    pub fn select(&mut self, id: &str) -> bool {
        if self.points.contains_key(id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.drag = None;
    }

    /// Finds the landmark whose canvas position is nearest to `at`, within
    /// `radius` canvas pixels.
    ///
    /// # Arguments
    /// * `at` - Click position in canvas space
    /// * `mapper` - Current image/canvas mapping
    /// * `radius` - Hit radius in canvas pixels, independent of zoom
    ///
    /// # Returns
    /// The id of the nearest hit; on equal distance the most recently added
    /// landmark wins.
    pub fn hit_test(&self, at: &CanvasPoint, mapper: &CoordinateMapper, radius: f64) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for id in self.history.iter().rev() {
            let Some(p) = self.points.get(id) else {
                continue;
            };
            let d = mapper.to_canvas_space(p).distance_to(at);
            if d <= radius && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((id.as_str(), d));
            }
        }
        best.map(|(id, _)| id.to_string())
    }

    /// Arms a drag on `id`, remembering where inside the marker it was
    /// grabbed so the point keeps its offset from the cursor.
    pub fn begin_drag(&mut self, id: &str, at: &CanvasPoint, mapper: &CoordinateMapper) -> bool {
        let Some(p) = self.points.get(id) else {
            return false;
        };
        let c = mapper.to_canvas_space(p);
        self.selected = Some(id.to_string());
        self.drag = Some(DragState {
            id: id.to_string(),
            grab_dx: at.x - c.x,
            grab_dy: at.y - c.y,
        });
        true
    }

    /// Moves the dragged landmark to follow the cursor.
    ///
    /// Returns the moved id and its new image-space position.
    pub fn drag_to(&mut self, at: &CanvasPoint, mapper: &CoordinateMapper) -> Option<(String, Point)> {
        let drag = self.drag.as_ref()?;
        let anchor = at.offset(-drag.grab_dx, -drag.grab_dy);
        let p = mapper.to_image_space(&anchor);
        let id = drag.id.clone();
        self.points.insert(id.clone(), p);
        Some((id, p))
    }

    /// Ends a drag. Returns `true` if one was active.
    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Points in insertion order, ready for persistence.
    pub fn to_ordered(&self) -> Vec<LandmarkPoint> {
        self.iter()
            .map(|(id, p)| LandmarkPoint {
                id: id.to_string(),
                x: p.x,
                y: p.y,
            })
            .collect()
    }

    /// Rebuilds a store from persisted points, keeping their order.
    ///
    /// Returns the first duplicated id on conflict.
    pub fn from_ordered(points: &[LandmarkPoint]) -> Result<Self, String> {
        let mut store = Self::new();
        for lp in points {
            if !store.insert(&lp.id, lp.point()) {
                return Err(lp.id.clone());
            }
        }
        Ok(store)
    }
}
