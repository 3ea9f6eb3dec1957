//! Map Object-Group Resolver
//!
//! Walks the map's object groups, one pass per group, and turns them into
//! the two tables the rest of the server consumes:
//! - group name → spawn positions (world space)
//! - group name → collider polygons (world space)
//!
//! Group names are classified once through `GroupRules`. The tables are laid
//! out first (one slot per contributing group name) and filled second.

mod group;

pub use group::GroupKind;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collider::ColliderIndex;
use crate::config::GroupRules;
use crate::error::MapError;
use crate::geometry::{IsometricTransform, Polygon2D, Vec2D};
use crate::model::{Map, ObjectGroup};

/// Output tables of a map load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapColliders {
    pub spawn_points: HashMap<String, Vec<Vec2D>>,
    pub colliders: HashMap<String, Vec<Polygon2D>>,
    /// Group names no rule matched, in document order
    pub unhandled_groups: Vec<String>,
}

impl MapColliders {
    /// Empty tables with one slot per contributing group name
    fn with_slots(plan: &[(&ObjectGroup, GroupKind)]) -> Self {
        let mut spawn_points = HashMap::with_capacity(
            plan.iter().filter(|(_, kind)| kind.yields_points()).count(),
        );
        let mut colliders = HashMap::with_capacity(
            plan.iter().filter(|(_, kind)| kind.yields_polygons()).count(),
        );
        let mut unhandled_groups = Vec::new();

        for (group, kind) in plan {
            if kind.yields_points() {
                spawn_points.insert(group.name.clone(), Vec::new());
            } else if kind.yields_polygons() {
                colliders.insert(group.name.clone(), Vec::new());
            } else if *kind == GroupKind::Unhandled && !unhandled_groups.contains(&group.name) {
                unhandled_groups.push(group.name.clone());
            }
        }

        Self {
            spawn_points,
            colliders,
            unhandled_groups,
        }
    }

    pub fn spawn_points(&self, group: &str) -> &[Vec2D] {
        self.spawn_points.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn colliders(&self, group: &str) -> &[Polygon2D] {
        self.colliders.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn polygon_count(&self) -> usize {
        self.colliders.values().map(Vec::len).sum()
    }

    pub fn spawn_point_count(&self) -> usize {
        self.spawn_points.values().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Resolve every object group of `map` against the collider index
pub fn resolve_object_groups(
    map: &Map,
    index: &ColliderIndex,
    transform: &IsometricTransform,
    rules: &GroupRules,
) -> Result<MapColliders, MapError> {
    let plan: Vec<(&ObjectGroup, GroupKind)> = map
        .object_groups
        .iter()
        .map(|group| (group, rules.classify(&group.name)))
        .collect();

    let mut tables = MapColliders::with_slots(&plan);

    for (group, kind) in &plan {
        debug!(
            group = %group.name,
            kind = kind.as_str(),
            objects = group.objects.len(),
            "resolving object group"
        );

        match kind {
            GroupKind::SpawnPoints => {
                let points = spawn_points(group, transform);
                if let Some(slot) = tables.spawn_points.get_mut(&group.name) {
                    slot.extend(points);
                }
            }
            GroupKind::Barrier => {
                let polygons = barrier_polygons(group, transform, rules)?;
                if let Some(slot) = tables.colliders.get_mut(&group.name) {
                    slot.extend(polygons);
                }
            }
            GroupKind::InstancedCollider(label) => {
                let polygons = instanced_polygons(group, label, index, transform);
                if let Some(slot) = tables.colliders.get_mut(&group.name) {
                    slot.extend(polygons);
                }
            }
            GroupKind::Ignored => {}
            GroupKind::Unhandled => {
                debug!(group = %group.name, "no rule for object group, ignored");
            }
        }
    }

    Ok(tables)
}

/// Every object's position, as an absolute world position
pub fn spawn_points(group: &ObjectGroup, transform: &IsometricTransform) -> Vec<Vec2D> {
    group
        .objects
        .iter()
        .map(|object| transform.offset_transform(object.position()))
        .collect()
}

/// Polylines of marked objects.
///
/// Anchor is the object's world position and vertices are offsets from it;
/// since an authored polyline starts at `0,0`, vertex 0 sits on the anchor.
pub fn barrier_polygons(
    group: &ObjectGroup,
    transform: &IsometricTransform,
    rules: &GroupRules,
) -> Result<Vec<Polygon2D>, MapError> {
    let marker = &rules.barrier_marker;
    let mut polygons = Vec::new();

    for object in &group.objects {
        let Some(polyline) = &object.polyline else {
            continue;
        };
        if object.property(&marker.name, rules.type_property_lookup) != Some(marker.value.as_str())
        {
            debug!(group = %group.name, object = object.id, "unmarked polyline skipped");
            continue;
        }

        let anchor = transform.offset_transform(object.position());
        let coordinates = polyline.coordinates()?;
        let mut polygon = Polygon2D::with_capacity(Some(anchor), coordinates.len());
        polygon
            .points
            .extend(coordinates.into_iter().map(|p| transform.vector_transform(p)));
        polygons.push(polygon);
    }

    Ok(polygons)
}

/// Copies of the indexed outlines of each tile object, anchored at its
/// placement. Vertices stay tile-center relative, so the anchor is not
/// vertex 0 here.
pub fn instanced_polygons(
    group: &ObjectGroup,
    label: &str,
    index: &ColliderIndex,
    transform: &IsometricTransform,
) -> Vec<Polygon2D> {
    let mut polygons = Vec::new();

    for object in &group.objects {
        let Some(gid) = object.tile_gid() else {
            continue;
        };
        let Some(templates) = index.get(gid, label) else {
            debug!(group = %group.name, gid, label, "no indexed collider for tile object");
            continue;
        };

        let anchor = transform.offset_transform(object.position());
        polygons.extend(templates.iter().map(|template| template.placed_at(anchor)));
    }

    polygons
}
