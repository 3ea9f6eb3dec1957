//! `<polyline points="x,y x,y ...">` payloads.

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::geometry::Vec2D;

/// Polyline points relative to the owning object's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    #[serde(rename = "@points")]
    pub points: String,
}

impl Polyline {
    pub fn new(points: impl Into<String>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Parse the space separated `x,y` pairs.
    ///
    /// Any token that is not a pair of finite numbers fails the load.
    pub fn coordinates(&self) -> Result<Vec<Vec2D>, MapError> {
        self.points
            .split_whitespace()
            .map(|pair| self.parse_pair(pair))
            .collect()
    }

    pub fn pair_count(&self) -> usize {
        self.points.split_whitespace().count()
    }

    fn parse_pair(&self, pair: &str) -> Result<Vec2D, MapError> {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| self.malformed(format!("expected \"x,y\", got \"{pair}\"")))?;
        Ok(Vec2D::new(self.parse_coordinate(x)?, self.parse_coordinate(y)?))
    }

    fn parse_coordinate(&self, raw: &str) -> Result<f64, MapError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|e| self.malformed(format!("coordinate \"{raw}\": {e}")))?;
        if !value.is_finite() {
            return Err(self.malformed(format!("coordinate \"{raw}\" is not finite")));
        }
        Ok(value)
    }

    fn malformed(&self, reason: String) -> MapError {
        MapError::MalformedPolyline {
            points: self.points.clone(),
            reason,
        }
    }
}
