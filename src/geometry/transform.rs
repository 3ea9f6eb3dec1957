//! Isometric object-layer space → physics world space.
//!
//! The only place the projection is computed. Everything that moves a
//! coordinate out of layer space goes through `vector_transform` or
//! `offset_transform`.

use bevy::math::DMat2;
use serde::{Deserialize, Serialize};

use super::Vec2D;
use crate::error::MapError;
use crate::model::Map;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsometricTransform {
    matrix: DMat2,
    calibration: Vec2D,
}

impl IsometricTransform {
    /// Build from the map's tile size (pixels) and grid height (tiles).
    ///
    /// With half-diagonal `L = sqrt((W/2)² + (H/2)²)`, scale `s = L / H`,
    /// `c = (W/2) / L` and `sn = (H/2) / L`:
    ///
    /// ```text
    /// [  s·c   -s·c  ]
    /// [ -s·sn  -s·sn ]
    /// ```
    pub fn new(tile_width: u32, tile_height: u32, map_height: u32) -> Self {
        let half_width = f64::from(tile_width) * 0.5;
        let half_height = f64::from(tile_height) * 0.5;
        let half_diagonal = (half_width * half_width + half_height * half_height).sqrt();
        let scale = half_diagonal / f64::from(tile_height);
        let cosine = half_width / half_diagonal;
        let sine = half_height / half_diagonal;

        // Columns of the row-major matrix above
        let matrix = DMat2::from_cols(
            Vec2D::new(scale * cosine, -scale * sine),
            Vec2D::new(-scale * cosine, -scale * sine),
        );

        Self {
            matrix,
            calibration: Vec2D::new(0.0, f64::from(map_height) * 0.5),
        }
    }

    /// Transform for a parsed map; zero tile sizes are rejected
    pub fn for_map(map: &Map) -> Result<Self, MapError> {
        if map.tile_width == 0 || map.tile_height == 0 {
            return Err(MapError::InvalidDimensions {
                target: "map tile".to_string(),
                width: map.tile_width,
                height: map.tile_height,
            });
        }
        Ok(Self::new(map.tile_width, map.tile_height, map.height))
    }

    /// Layer-local vector → world vector
    pub fn vector_transform(&self, v: Vec2D) -> Vec2D {
        self.matrix * v
    }

    /// Absolute layer-local position → absolute world position
    pub fn offset_transform(&self, v: Vec2D) -> Vec2D {
        self.vector_transform(v) + self.calibration
    }

    pub fn matrix(&self) -> DMat2 {
        self.matrix
    }

    pub fn calibration(&self) -> Vec2D {
        self.calibration
    }
}
