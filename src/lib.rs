//! Battle Map Core Library
//!
//! Turns the tile-map and tileset documents authored for a battle into the
//! geometry the game server runs physics on:
//! - Structured map model (map, tilesets, layers, object groups)
//! - Tile grid decoding (base64 + zlib payloads, flip flags)
//! - Isometric layer space → physics world space transform
//! - Per-tile collider extraction keyed by gid and type label
//! - Object group resolution into spawn points and collider polygons

pub mod collider;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod plugin;
pub mod resolver;

pub use collider::ColliderIndex;
pub use config::{GroupRules, PipelineConfig};
pub use error::MapError;
pub use geometry::{IsometricTransform, Polygon2D, Vec2D};
pub use grid::{DecodedTile, TileGrid};
pub use model::{Map, Tileset};
pub use pipeline::{LoadedMap, MapColliderCache, MapLoader, TilesetDocuments};
pub use resolver::{GroupKind, MapColliders};
