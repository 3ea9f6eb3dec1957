//! Physics-world geometry: points, polygons and the layer → world transform.

mod transform;

pub use transform::IsometricTransform;

use serde::{Deserialize, Serialize};

/// A point or vector in physics-world space
pub type Vec2D = bevy::math::DVec2;

/// Collider outline in physics-world orientation.
///
/// `points` are offsets from `anchor`. Templates held by the collider index
/// have no anchor yet; it is assigned per placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon2D {
    pub anchor: Option<Vec2D>,
    pub points: Vec<Vec2D>,
}

impl Polygon2D {
    pub fn new(anchor: Option<Vec2D>, points: Vec<Vec2D>) -> Self {
        Self { anchor, points }
    }

    pub fn with_capacity(anchor: Option<Vec2D>, capacity: usize) -> Self {
        Self {
            anchor,
            points: Vec::with_capacity(capacity),
        }
    }

    /// A fresh polygon at `anchor` that owns its own copy of the vertices
    pub fn placed_at(&self, anchor: Vec2D) -> Self {
        Self {
            anchor: Some(anchor),
            points: self.points.clone(),
        }
    }

    /// Vertices as absolute world positions (anchor + offset)
    pub fn world_points(&self) -> Vec<Vec2D> {
        let anchor = self.anchor.unwrap_or(Vec2D::ZERO);
        self.points.iter().map(|p| anchor + *p).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
