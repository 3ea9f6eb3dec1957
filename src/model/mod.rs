//! Structured Map Model
//!
//! Typed view of a map document and its tileset documents. Deserialized with
//! quick-xml: attributes are `@name` fields, element children are named
//! fields, anything unknown is ignored. Required attributes have no serde
//! default, so a missing or non-numeric one fails the whole document.

mod polyline;

pub use polyline::Polyline;

use serde::{Deserialize, Serialize};

use crate::constants::GID_MASK;
use crate::error::MapError;
use crate::geometry::Vec2D;

// =====================================================
// Shared between map and tileset documents
// =====================================================

/// A single `name`/`value` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: String,
}

/// How a named property is located inside a `PropertySet`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyLookup {
    /// Only the first property counts, and it must carry the name
    #[default]
    Leading,
    /// The first property with the name, wherever it sits
    AnyPosition,
}

/// The `<properties>` block of an object or tile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    #[serde(rename = "property", default)]
    pub properties: Vec<Property>,
}

impl PropertySet {
    pub fn first(&self) -> Option<&Property> {
        self.properties.first()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Value of `name` under the given lookup rule
    pub fn value_of(&self, name: &str, lookup: PropertyLookup) -> Option<&str> {
        let property = match lookup {
            PropertyLookup::Leading => self.first().filter(|p| p.name == name),
            PropertyLookup::AnyPosition => self.get(name),
        };
        property.map(|p| p.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A placed object, in layer-local pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// 0 when the document predates object ids
    #[serde(rename = "@id", default)]
    pub id: u32,
    /// Raw gid (may carry flip bits); present only on tile objects
    #[serde(rename = "@gid")]
    pub gid: Option<u32>,
    #[serde(rename = "@x")]
    pub x: f64,
    #[serde(rename = "@y")]
    pub y: f64,
    pub properties: Option<PropertySet>,
    pub polyline: Option<Polyline>,
}

impl Object {
    /// Gid with the flip bits masked off
    pub fn tile_gid(&self) -> Option<u32> {
        self.gid.map(|raw| raw & GID_MASK)
    }

    /// Anchor position in layer-local space
    pub fn position(&self) -> Vec2D {
        Vec2D::new(self.x, self.y)
    }

    /// Value of a property, `None` when the object has no properties at all
    pub fn property(&self, name: &str, lookup: PropertyLookup) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|props| props.value_of(name, lookup))
    }
}

/// `<objectgroup>`: the name is a semantic discriminator, not a label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroup {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@draworder")]
    pub draw_order: Option<String>,
    #[serde(rename = "object", default)]
    pub objects: Vec<Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "@source")]
    pub source: String,
    #[serde(rename = "@width", default)]
    pub width: u32,
    #[serde(rename = "@height", default)]
    pub height: u32,
}

// =====================================================
// Tileset documents
// =====================================================

/// One `<tile>` definition inside a tileset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Local id; gid = first gid + id
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(rename = "objectgroup")]
    pub object_group: Option<ObjectGroup>,
    pub properties: Option<PropertySet>,
}

/// A standalone tileset document (or an embedded one, once converted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "@tileheight")]
    pub tile_height: u32,
    #[serde(rename = "@tilecount", default)]
    pub tile_count: u32,
    #[serde(rename = "@columns", default)]
    pub columns: u32,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(rename = "tile", default)]
    pub tiles: Vec<TileDefinition>,
}

impl Tileset {
    pub fn from_xml(xml: &str) -> Result<Self, MapError> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}

// =====================================================
// Map documents
// =====================================================

/// `<tileset>` reference inside a map; either embedded or `source=`-linked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTileset {
    #[serde(rename = "@firstgid")]
    pub first_gid: u32,
    #[serde(rename = "@source")]
    pub source: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@tilewidth")]
    pub tile_width: Option<u32>,
    #[serde(rename = "@tileheight")]
    pub tile_height: Option<u32>,
    #[serde(rename = "image", default)]
    pub images: Vec<Image>,
    #[serde(rename = "tile", default)]
    pub tiles: Vec<TileDefinition>,
}

impl MapTileset {
    pub fn is_external(&self) -> bool {
        self.source.is_some()
    }

    /// The embedded definition as a standalone tileset
    pub fn embedded(&self) -> Result<Tileset, MapError> {
        let (Some(tile_width), Some(tile_height)) = (self.tile_width, self.tile_height) else {
            return Err(MapError::DocumentMalformed(format!(
                "embedded tileset '{}' (firstgid {}) has no tile size",
                self.name, self.first_gid
            )));
        };
        Ok(Tileset {
            name: self.name.clone(),
            tile_width,
            tile_height,
            tile_count: 0,
            columns: 0,
            images: self.images.clone(),
            tiles: self.tiles.clone(),
        })
    }
}

/// `<data>` of a tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    #[serde(rename = "@encoding", default)]
    pub encoding: String,
    #[serde(rename = "@compression")]
    pub compression: Option<String>,
    #[serde(rename = "$text", default)]
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@width")]
    pub width: u32,
    #[serde(rename = "@height")]
    pub height: u32,
    pub data: LayerData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "@orientation", default)]
    pub orientation: String,
    /// Grid width in tiles
    #[serde(rename = "@width")]
    pub width: u32,
    /// Grid height in tiles
    #[serde(rename = "@height")]
    pub height: u32,
    #[serde(rename = "@tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "@tileheight")]
    pub tile_height: u32,
    pub properties: Option<PropertySet>,
    #[serde(rename = "tileset", default)]
    pub tilesets: Vec<MapTileset>,
    #[serde(rename = "layer", default)]
    pub layers: Vec<Layer>,
    #[serde(rename = "objectgroup", default)]
    pub object_groups: Vec<ObjectGroup>,
}

impl Map {
    pub fn from_xml(xml: &str) -> Result<Self, MapError> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Index into `tilesets` of the tileset whose gid range holds `gid`
    pub fn tileset_index_for_gid(&self, gid: u32) -> Option<usize> {
        tileset_index_for_gid(&self.tilesets, gid)
    }

    pub fn object_group(&self, name: &str) -> Option<&ObjectGroup> {
        self.object_groups.iter().find(|g| g.name == name)
    }
}

/// The range owner is the tileset with the greatest first gid not above `gid`.
/// Gid 0 is the empty cell and belongs to no tileset.
pub fn tileset_index_for_gid(tilesets: &[MapTileset], gid: u32) -> Option<usize> {
    if gid == 0 {
        return None;
    }
    tilesets
        .iter()
        .enumerate()
        .filter(|(_, ts)| ts.first_gid <= gid)
        .max_by_key(|(_, ts)| ts.first_gid)
        .map(|(index, _)| index)
}
