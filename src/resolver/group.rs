use serde::{Deserialize, Serialize};

/// What an object group name means to the resolver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    /// Player start positions
    SpawnPoints,
    /// Static boundary polygons drawn directly in the map
    Barrier,
    /// Tile objects instancing the collider indexed under this type label
    InstancedCollider(String),
    /// Known, deliberately not turned into geometry
    Ignored,
    /// Not listed in any rule
    Unhandled,
}

impl GroupKind {
    pub fn as_str(&self) -> &str {
        match self {
            GroupKind::SpawnPoints => "spawn_points",
            GroupKind::Barrier => "barrier",
            GroupKind::InstancedCollider(_) => "instanced_collider",
            GroupKind::Ignored => "ignored",
            GroupKind::Unhandled => "unhandled",
        }
    }

    /// Groups that contribute to the spawn point table
    pub fn yields_points(&self) -> bool {
        matches!(self, GroupKind::SpawnPoints)
    }

    /// Groups that contribute to the collider table
    pub fn yields_polygons(&self) -> bool {
        matches!(self, GroupKind::Barrier | GroupKind::InstancedCollider(_))
    }
}
