use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::MapError;
use crate::model::PropertyLookup;
use crate::resolver::GroupKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub group_rules: GroupRules,
}

impl PipelineConfig {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A required `name = value` property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMatch {
    pub name: String,
    pub value: String,
}

/// Which object group names mean what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRules {
    pub spawn_point_groups: Vec<String>,
    pub barrier_groups: Vec<String>,
    /// Groups whose tile objects instance the collider indexed under the group name
    pub instanced_collider_groups: Vec<String>,
    pub ignored_groups: Vec<String>,
    pub barrier_marker: PropertyMatch,
    /// Property carrying the collider type label on tileset objects
    pub collider_type_property: String,
    pub type_property_lookup: PropertyLookup,
}

impl Default for GroupRules {
    fn default() -> Self {
        Self {
            spawn_point_groups: vec![GROUP_PLAYER_STARTING_POS.to_string()],
            barrier_groups: vec![GROUP_BARRIER.to_string()],
            instanced_collider_groups: vec![
                GROUP_LOW_SCORE_TREASURE.to_string(),
                GROUP_GUARD_TOWER.to_string(),
                GROUP_HIGH_SCORE_TREASURE.to_string(),
            ],
            ignored_groups: vec![GROUP_PUMPKIN.to_string(), GROUP_SPEED_SHOE.to_string()],
            barrier_marker: PropertyMatch {
                name: PROPERTY_BOUNDARY_TYPE.to_string(),
                value: BOUNDARY_TYPE_BARRIER.to_string(),
            },
            collider_type_property: PROPERTY_COLLIDER_TYPE.to_string(),
            type_property_lookup: PropertyLookup::Leading,
        }
    }
}

impl GroupRules {
    /// Resolve a raw group name. Precedence: spawn, barrier, instanced, ignored.
    pub fn classify(&self, name: &str) -> GroupKind {
        let listed = |names: &[String]| names.iter().any(|n| n == name);

        if listed(&self.spawn_point_groups) {
            GroupKind::SpawnPoints
        } else if listed(&self.barrier_groups) {
            GroupKind::Barrier
        } else if listed(&self.instanced_collider_groups) {
            GroupKind::InstancedCollider(name.to_string())
        } else if listed(&self.ignored_groups) {
            GroupKind::Ignored
        } else {
            GroupKind::Unhandled
        }
    }
}
