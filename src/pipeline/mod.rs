//! Map load pipeline
//!
//! One call turns a map document plus its tileset documents into everything
//! the battle server needs at startup. Stages run in a fixed order:
//! parse → validate → transform → collider index → object groups.
//!
//! Tile layers are not touched by a load. Renderers decode them on demand
//! through `LoadedMap::decode_layers`, so a layer in an unsupported format
//! never costs the server its spawn and collider tables.

mod cache;

pub use cache::{asset_digest, digest_prefix, MapColliderCache};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collider::{extract_tileset_colliders, ColliderIndex};
use crate::config::PipelineConfig;
use crate::constants::ORIENTATION_ISOMETRIC;
use crate::error::MapError;
use crate::geometry::IsometricTransform;
use crate::grid::TileGrid;
use crate::logging::TimingSpan;
use crate::model::{Map, MapTileset, Tileset};
use crate::resolver::{resolve_object_groups, MapColliders};

// ============================================================================
// Tileset documents
// ============================================================================

/// External tileset documents keyed by the `source` attribute that refers
/// to them. Reading them from disk is the caller's business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetDocuments(BTreeMap<String, String>);

impl TilesetDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, xml: impl Into<String>) {
        self.0.insert(source.into(), xml.into());
    }

    pub fn with(mut self, source: impl Into<String>, xml: impl Into<String>) -> Self {
        self.insert(source, xml);
        self
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(source, xml)| (source.as_str(), xml.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Loaded map
// ============================================================================

/// Result of a successful load. Read-only once built.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub map: Map,
    pub transform: IsometricTransform,
    pub collider_index: ColliderIndex,
    pub tables: MapColliders,
}

impl LoadedMap {
    /// Decode every tile layer, in document order
    pub fn decode_layers(&self) -> Result<Vec<TileGrid>, MapError> {
        let _timing = TimingSpan::new("decode_layers");
        self.map
            .layers
            .iter()
            .map(|layer| layer.decode(&self.map.tilesets))
            .collect()
    }

    /// Decode one layer by name; `None` when the map has no such layer
    pub fn decode_layer(&self, name: &str) -> Option<Result<TileGrid, MapError>> {
        self.map
            .layers
            .iter()
            .find(|layer| layer.name == name)
            .map(|layer| layer.decode(&self.map.tilesets))
    }

    /// Spawn point and collider tables as JSON
    pub fn to_json(&self) -> String {
        self.tables.to_json()
    }
}

// ============================================================================
// Loader
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MapLoader {
    config: PipelineConfig,
}

impl MapLoader {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse and resolve a map. Any error aborts the whole load.
    /// Tile layer payloads are left encoded.
    pub fn load(&self, map_xml: &str, tilesets: &TilesetDocuments) -> Result<LoadedMap, MapError> {
        let _timing = TimingSpan::new("map_load");
        let rules = &self.config.group_rules;

        let map = Map::from_xml(map_xml)?;
        validate_orientation(&map)?;
        let transform = IsometricTransform::for_map(&map)?;

        let mut colliders = Vec::new();
        for entry in &map.tilesets {
            let tileset = resolve_tileset(entry, tilesets)?;
            colliders.extend(extract_tileset_colliders(
                &tileset,
                entry.first_gid,
                &transform,
                rules,
            )?);
        }
        let collider_index = ColliderIndex::build(colliders);

        let tables = resolve_object_groups(&map, &collider_index, &transform, rules)?;

        info!(
            width = map.width,
            height = map.height,
            tilesets = map.tilesets.len(),
            indexed_gids = collider_index.gid_count(),
            spawn_points = tables.spawn_point_count(),
            colliders = tables.polygon_count(),
            layers = map.layers.len(),
            "map loaded"
        );
        if !tables.unhandled_groups.is_empty() {
            info!(groups = ?tables.unhandled_groups, "object groups without a rule");
        }

        Ok(LoadedMap {
            map,
            transform,
            collider_index,
            tables,
        })
    }
}

/// Only isometric maps are supported; a missing attribute counts as isometric
fn validate_orientation(map: &Map) -> Result<(), MapError> {
    match map.orientation.as_str() {
        "" | ORIENTATION_ISOMETRIC => Ok(()),
        other => Err(MapError::UnsupportedOrientation(other.to_string())),
    }
}

fn resolve_tileset(entry: &MapTileset, documents: &TilesetDocuments) -> Result<Tileset, MapError> {
    match &entry.source {
        Some(source) => {
            let xml = documents
                .get(source)
                .ok_or_else(|| MapError::UnresolvedTileset(source.clone()))?;
            debug!(source = %source, first_gid = entry.first_gid, "parsing external tileset");
            Tileset::from_xml(xml)
        }
        None => entry.embedded(),
    }
}
