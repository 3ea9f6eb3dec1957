//! Tileset Collider Extractor
//!
//! Tiles may carry an object group of polyline outlines, each labelled by a
//! `type` property. Every outline is re-expressed relative to the tile
//! center, pushed through the isometric transform and indexed by
//! (gid, type label). The index is built once per load and only read
//! afterwards; placements copy out of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GroupRules;
use crate::error::MapError;
use crate::geometry::{IsometricTransform, Polygon2D, Vec2D};
use crate::model::{Polyline, Tileset};

/// Per-object annotation mismatch. Logged and skipped, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationIssue {
    /// The object has a type label but no polyline
    MissingPolyline,
    /// The object has a polyline but no usable type label
    MissingTypeProperty,
}

impl AnnotationIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationIssue::MissingPolyline => "missing_polyline",
            AnnotationIssue::MissingTypeProperty => "missing_type_property",
        }
    }
}

/// One extracted outline before indexing
#[derive(Debug, Clone, PartialEq)]
pub struct TileCollider {
    pub gid: u32,
    pub label: String,
    pub polygon: Polygon2D,
}

/// Offset of a tile-local polyline point from the tile center.
///
/// Tile-local y grows downward, world y grows upward, hence the inversion.
pub fn tile_center_offset(point: Vec2D, object_pos: Vec2D, tile_width: u32, tile_height: u32) -> Vec2D {
    let half_width = f64::from(tile_width) * 0.5;
    let half_height = f64::from(tile_height) * 0.5;
    Vec2D::new(
        (point.x + object_pos.x) - half_width,
        half_height - (point.y + object_pos.y),
    )
}

/// Unanchored world-space outline of one tileset polyline
pub fn tile_polygon(
    polyline: &Polyline,
    object_pos: Vec2D,
    tileset: &Tileset,
    transform: &IsometricTransform,
) -> Result<Polygon2D, MapError> {
    let coordinates = polyline.coordinates()?;
    let mut polygon = Polygon2D::with_capacity(None, coordinates.len());
    for point in coordinates {
        let offset = tile_center_offset(point, object_pos, tileset.tile_width, tileset.tile_height);
        polygon.points.push(transform.vector_transform(offset));
    }
    Ok(polygon)
}

/// Extract every labelled polyline of a tileset
pub fn extract_tileset_colliders(
    tileset: &Tileset,
    first_gid: u32,
    transform: &IsometricTransform,
    rules: &GroupRules,
) -> Result<Vec<TileCollider>, MapError> {
    let mut colliders = Vec::new();
    let mut skipped = 0usize;

    for tile in &tileset.tiles {
        let Some(group) = &tile.object_group else {
            continue;
        };
        let gid = first_gid.checked_add(tile.id).ok_or_else(|| {
            MapError::DocumentMalformed(format!(
                "tile id {} overflows gid range of tileset '{}'",
                tile.id, tileset.name
            ))
        })?;

        for object in &group.objects {
            let label =
                object.property(&rules.collider_type_property, rules.type_property_lookup);
            let (polyline, label) = match (&object.polyline, label) {
                (Some(polyline), Some(label)) => (polyline, label),
                (None, None) => {
                    debug!(gid, object = object.id, "tile object without outline skipped");
                    continue;
                }
                (None, Some(_)) => {
                    skip_object(gid, object.id, AnnotationIssue::MissingPolyline);
                    skipped += 1;
                    continue;
                }
                (Some(_), None) => {
                    skip_object(gid, object.id, AnnotationIssue::MissingTypeProperty);
                    skipped += 1;
                    continue;
                }
            };

            let polygon = tile_polygon(polyline, object.position(), tileset, transform)?;
            colliders.push(TileCollider {
                gid,
                label: label.to_string(),
                polygon,
            });
        }
    }

    debug!(
        tileset = %tileset.name,
        first_gid,
        count = colliders.len(),
        skipped,
        "extracted tile colliders"
    );
    Ok(colliders)
}

fn skip_object(gid: u32, object: u32, issue: AnnotationIssue) {
    warn!(gid, object, issue = issue.as_str(), "inconsistent collider annotation, skipped");
}

/// gid → type label → outline templates (tile-center relative, unanchored)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderIndex {
    by_gid: HashMap<u32, HashMap<String, Vec<Polygon2D>>>,
}

impl ColliderIndex {
    /// Build the index in one pass over the sorted records, so every
    /// (gid, label) slot is inserted exactly once with its finished list.
    /// Authoring order is kept within a slot.
    pub fn build(mut colliders: Vec<TileCollider>) -> Self {
        colliders.sort_by(|a, b| a.gid.cmp(&b.gid).then_with(|| a.label.cmp(&b.label)));

        let gid_count = colliders
            .windows(2)
            .filter(|pair| pair[0].gid != pair[1].gid)
            .count()
            + usize::from(!colliders.is_empty());
        let mut by_gid = HashMap::with_capacity(gid_count);

        let mut records = colliders.into_iter().peekable();
        while let Some(first) = records.next() {
            let gid = first.gid;
            let mut labels: HashMap<String, Vec<Polygon2D>> = HashMap::new();
            let mut label = first.label;
            let mut polygons = vec![first.polygon];

            while let Some(next) = records.next_if(|r| r.gid == gid) {
                if next.label != label {
                    let finished = std::mem::replace(&mut label, next.label);
                    labels.insert(finished, std::mem::take(&mut polygons));
                }
                polygons.push(next.polygon);
            }
            labels.insert(label, polygons);
            by_gid.insert(gid, labels);
        }

        Self { by_gid }
    }

    /// Index a single tileset
    pub fn from_tileset(
        tileset: &Tileset,
        first_gid: u32,
        transform: &IsometricTransform,
        rules: &GroupRules,
    ) -> Result<Self, MapError> {
        Ok(Self::build(extract_tileset_colliders(
            tileset, first_gid, transform, rules,
        )?))
    }

    pub fn get(&self, gid: u32, label: &str) -> Option<&[Polygon2D]> {
        self.by_gid
            .get(&gid)
            .and_then(|labels| labels.get(label))
            .map(Vec::as_slice)
    }

    pub fn labels(&self, gid: u32) -> impl Iterator<Item = &str> {
        self.by_gid
            .get(&gid)
            .into_iter()
            .flat_map(|labels| labels.keys().map(String::as_str))
    }

    pub fn contains_gid(&self, gid: u32) -> bool {
        self.by_gid.contains_key(&gid)
    }

    pub fn gid_count(&self) -> usize {
        self.by_gid.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.by_gid
            .values()
            .flat_map(|labels| labels.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyLookup;

    const EPS: f64 = 1e-9;

    const TSX: &str = r#"<tileset name="towers" tilewidth="64" tileheight="32">
 <tile id="13">
  <objectgroup draworder="index">
   <object id="1" x="0" y="0">
    <properties><property name="type" value="GuardTower"/></properties>
    <polyline points="0,0 -95,179"/>
   </object>
   <object id="2" x="10" y="-4">
    <properties><property name="type" value="GuardTower"/></properties>
    <polyline points="0,0 20,0 20,20"/>
   </object>
   <object id="3" x="0" y="0">
    <properties><property name="type" value="Shadow"/></properties>
    <polyline points="1,1 2,2 3,3 4,4"/>
   </object>
  </objectgroup>
 </tile>
 <tile id="2">
  <objectgroup>
   <object id="1" x="0" y="0">
    <polyline points="0,0 5,5"/>
   </object>
   <object id="2" x="0" y="0">
    <properties><property name="type" value="LowScoreTreasure"/></properties>
   </object>
   <object id="3" x="0" y="0" width="8" height="8"/>
   <object id="4" x="0" y="0">
    <properties>
     <property name="score" value="100"/>
     <property name="type" value="LowScoreTreasure"/>
    </properties>
    <polyline points="0,0 6,0 6,6"/>
   </object>
  </objectgroup>
 </tile>
 <tile id="5"/>
</tileset>"#;

    fn transform() -> IsometricTransform {
        IsometricTransform::new(64, 32, 10)
    }

    #[test]
    fn test_tile_center_offset_intermediate_values() {
        let object = Vec2D::ZERO;
        let a = tile_center_offset(Vec2D::new(0.0, 0.0), object, 64, 32);
        let b = tile_center_offset(Vec2D::new(-95.0, 179.0), object, 64, 32);
        assert_eq!(a, Vec2D::new(-32.0, 16.0));
        assert_eq!(b, Vec2D::new(-127.0, -163.0));

        // M = [[1, -1], [-0.5, -0.5]] for 64x32 tiles
        let t = transform();
        assert!(t.vector_transform(a).abs_diff_eq(Vec2D::new(-48.0, 8.0), EPS));
        assert!(t.vector_transform(b).abs_diff_eq(Vec2D::new(36.0, 145.0), EPS));
    }

    #[test]
    fn test_object_offset_is_added() {
        let p = tile_center_offset(Vec2D::new(20.0, 20.0), Vec2D::new(10.0, -4.0), 64, 32);
        assert_eq!(p, Vec2D::new(-2.0, 0.0));
    }

    #[test]
    fn test_index_by_gid_and_label() {
        let tileset = Tileset::from_xml(TSX).unwrap();
        let index =
            ColliderIndex::from_tileset(&tileset, 1, &transform(), &GroupRules::default())
                .unwrap();

        let towers = index.get(14, "GuardTower").unwrap();
        assert_eq!(towers.len(), 2);
        assert_eq!(towers[0].len(), 2);
        assert_eq!(towers[1].len(), 3);
        assert!(towers.iter().all(|p| p.anchor.is_none()));
        assert!(towers[0].points[0].abs_diff_eq(Vec2D::new(-48.0, 8.0), EPS));
        assert!(towers[0].points[1].abs_diff_eq(Vec2D::new(36.0, 145.0), EPS));

        assert_eq!(index.get(14, "Shadow").unwrap()[0].len(), 4);
        let mut labels: Vec<_> = index.labels(14).collect();
        labels.sort();
        assert_eq!(labels, ["GuardTower", "Shadow"]);

        assert!(index.get(13, "GuardTower").is_none());
        assert!(index.get(14, "HighScoreTreasure").is_none());
    }

    #[test]
    fn test_inconsistent_annotations_are_skipped() {
        let tileset = Tileset::from_xml(TSX).unwrap();
        let index =
            ColliderIndex::from_tileset(&tileset, 1, &transform(), &GroupRules::default())
                .unwrap();

        // tile 2: no type / no polyline / neither / type not leading
        assert!(!index.contains_gid(3));
        assert!(!index.contains_gid(6));
        assert_eq!(index.gid_count(), 1);
        assert_eq!(index.polygon_count(), 3);
    }

    #[test]
    fn test_any_position_type_lookup() {
        let tileset = Tileset::from_xml(TSX).unwrap();
        let rules = GroupRules {
            type_property_lookup: PropertyLookup::AnyPosition,
            ..GroupRules::default()
        };
        let index = ColliderIndex::from_tileset(&tileset, 1, &transform(), &rules).unwrap();
        let treasure = index.get(3, "LowScoreTreasure").unwrap();
        assert_eq!(treasure.len(), 1);
        assert_eq!(treasure[0].len(), 3);
    }

    #[test]
    fn test_first_gid_offsets_keys() {
        let tileset = Tileset::from_xml(TSX).unwrap();
        let index =
            ColliderIndex::from_tileset(&tileset, 101, &transform(), &GroupRules::default())
                .unwrap();
        assert!(index.contains_gid(114));
        assert!(!index.contains_gid(14));
    }

    #[test]
    fn test_malformed_polyline_is_fatal() {
        let xml = r#"<tileset tilewidth="64" tileheight="32">
 <tile id="0"><objectgroup><object id="1" x="0" y="0">
  <properties><property name="type" value="Barrier"/></properties>
  <polyline points="0,0 x,1"/>
 </object></objectgroup></tile>
</tileset>"#;
        let tileset = Tileset::from_xml(xml).unwrap();
        let result =
            ColliderIndex::from_tileset(&tileset, 1, &transform(), &GroupRules::default());
        assert!(matches!(result, Err(MapError::MalformedPolyline { .. })));
    }

    #[test]
    fn test_build_merges_records_across_tilesets() {
        let poly = |x: f64| Polygon2D::new(None, vec![Vec2D::new(x, 0.0)]);
        let records = vec![
            TileCollider { gid: 7, label: "b".into(), polygon: poly(1.0) },
            TileCollider { gid: 3, label: "a".into(), polygon: poly(2.0) },
            TileCollider { gid: 7, label: "a".into(), polygon: poly(3.0) },
            TileCollider { gid: 7, label: "b".into(), polygon: poly(4.0) },
        ];
        let index = ColliderIndex::build(records);

        assert_eq!(index.gid_count(), 2);
        assert_eq!(index.polygon_count(), 4);
        let b = index.get(7, "b").unwrap();
        assert_eq!(b[0].points[0].x, 1.0);
        assert_eq!(b[1].points[0].x, 4.0);
        assert_eq!(index.get(7, "a").unwrap().len(), 1);
        assert_eq!(index.get(3, "a").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = ColliderIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.polygon_count(), 0);
        assert_eq!(index.labels(1).count(), 0);
    }
}
