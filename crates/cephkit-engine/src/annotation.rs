//! Freeform markers dropped with the annotate tool.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    /// Projection the marker was placed on
    pub projection: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl Annotation {
    pub fn new(projection: &str, at: Point, text: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: at.x,
            y: at.y,
            projection: projection.to_string(),
            text,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
