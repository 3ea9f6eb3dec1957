use std::collections::HashMap;
use std::sync::Arc;

use sha3::{Digest, Sha3_256};
use tracing::debug;

use super::{LoadedMap, MapLoader, TilesetDocuments};
use crate::error::MapError;

/// SHA3-256 over the map text and every supplied tileset document.
/// Lengths are hashed ahead of each field so no two inputs collide by concatenation.
pub fn asset_digest(map_xml: &str, tilesets: &TilesetDocuments) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update((map_xml.len() as u64).to_le_bytes());
    hasher.update(map_xml.as_bytes());
    for (source, xml) in tilesets.iter() {
        hasher.update((source.len() as u64).to_le_bytes());
        hasher.update(source.as_bytes());
        hasher.update((xml.len() as u64).to_le_bytes());
        hasher.update(xml.as_bytes());
    }

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Leading 8 bytes of a digest as lowercase hex, for log fields
pub fn digest_prefix(digest: &[u8; 32]) -> String {
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Loads each distinct map asset once and hands out shared results
#[derive(Debug, Default)]
pub struct MapColliderCache {
    loader: MapLoader,
    entries: HashMap<[u8; 32], Arc<LoadedMap>>,
}

impl MapColliderCache {
    pub fn new(loader: MapLoader) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(
        &mut self,
        map_xml: &str,
        tilesets: &TilesetDocuments,
    ) -> Result<Arc<LoadedMap>, MapError> {
        let digest = asset_digest(map_xml, tilesets);
        if let Some(loaded) = self.entries.get(&digest) {
            debug!(digest = %digest_prefix(&digest), "map cache hit");
            return Ok(Arc::clone(loaded));
        }

        // failed loads are not cached
        let loaded = Arc::new(self.loader.load(map_xml, tilesets)?);
        debug!(digest = %digest_prefix(&digest), "map cached");
        self.entries.insert(digest, Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
