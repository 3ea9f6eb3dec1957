//! Fixed names and bit layouts of the map document format.
//!
//! Group names here are only the defaults of `GroupRules`; the resolver
//! always goes through the configured rules.

// =====================================================
// Global tile identifiers
// =====================================================

/// Bit 31 of a packed gid: tile is mirrored along the X axis
pub const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;

/// Bit 30 of a packed gid: tile is mirrored along the Y axis
pub const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;

/// Bit 29 of a packed gid: tile is mirrored along its anti-diagonal
pub const FLIPPED_DIAGONALLY_FLAG: u32 = 0x2000_0000;

/// Low 29 bits carry the base gid
pub const GID_MASK: u32 =
    !(FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_DIAGONALLY_FLAG);

/// Bytes per packed gid in a decoded layer payload
pub const BYTES_PER_GID: usize = 4;

// =====================================================
// Layer payloads
// =====================================================

pub const ENCODING_BASE64: &str = "base64";

pub const COMPRESSION_ZLIB: &str = "zlib";

pub const ORIENTATION_ISOMETRIC: &str = "isometric";

// =====================================================
// Object group names
// =====================================================

pub const GROUP_PLAYER_STARTING_POS: &str = "ControlledPlayerStartingPos";

pub const GROUP_BARRIER: &str = "Barrier";

pub const GROUP_LOW_SCORE_TREASURE: &str = "LowScoreTreasure";

pub const GROUP_HIGH_SCORE_TREASURE: &str = "HighScoreTreasure";

pub const GROUP_GUARD_TOWER: &str = "GuardTower";

pub const GROUP_PUMPKIN: &str = "Pumpkin";

pub const GROUP_SPEED_SHOE: &str = "SpeedShoe";

// =====================================================
// Property names
// =====================================================

/// Property naming the collider type label of a tileset object
pub const PROPERTY_COLLIDER_TYPE: &str = "type";

/// Property marking a map object as a static boundary
pub const PROPERTY_BOUNDARY_TYPE: &str = "boundary_type";

pub const BOUNDARY_TYPE_BARRIER: &str = "barrier";
