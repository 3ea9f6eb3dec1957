//! Tile Grid Decoder
//!
//! A tile layer's `<data>` is base64 text of a zlib stream holding one
//! little-endian u32 per cell, row-major. Each u32 packs the gid in its low
//! 29 bits and three flip flags in the top three.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    BYTES_PER_GID, COMPRESSION_ZLIB, ENCODING_BASE64, FLIPPED_DIAGONALLY_FLAG,
    FLIPPED_HORIZONTALLY_FLAG, FLIPPED_VERTICALLY_FLAG, GID_MASK,
};
use crate::error::MapError;
use crate::model::{tileset_index_for_gid, Layer, LayerData, MapTileset};

/// One decoded cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTile {
    /// Base gid, flip bits removed; 0 is an empty cell
    pub gid: u32,
    /// Index into the map's tilesets of the tileset owning `gid`
    pub tileset: Option<usize>,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub flip_diagonal: bool,
}

impl DecodedTile {
    /// Split a packed gid into base gid and flags (no tileset lookup)
    pub fn from_raw(raw: u32) -> Self {
        Self {
            gid: raw & GID_MASK,
            tileset: None,
            flip_horizontal: raw & FLIPPED_HORIZONTALLY_FLAG != 0,
            flip_vertical: raw & FLIPPED_VERTICALLY_FLAG != 0,
            flip_diagonal: raw & FLIPPED_DIAGONALLY_FLAG != 0,
        }
    }

    /// Split a packed gid and resolve its owning tileset
    pub fn resolve(raw: u32, tilesets: &[MapTileset]) -> Self {
        let mut tile = Self::from_raw(raw);
        tile.tileset = tileset_index_for_gid(tilesets, tile.gid);
        tile
    }

    /// Pack back into the on-disk u32
    pub fn to_raw(&self) -> u32 {
        let mut raw = self.gid & GID_MASK;
        if self.flip_horizontal {
            raw |= FLIPPED_HORIZONTALLY_FLAG;
        }
        if self.flip_vertical {
            raw |= FLIPPED_VERTICALLY_FLAG;
        }
        if self.flip_diagonal {
            raw |= FLIPPED_DIAGONALLY_FLAG;
        }
        raw
    }

    pub fn is_empty(&self) -> bool {
        self.gid == 0
    }
}

/// A decoded tile layer, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<DecodedTile>,
}

impl TileGrid {
    pub fn get(&self, x: u32, y: u32) -> Option<&DecodedTile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[DecodedTile]> {
        self.tiles.chunks(self.width.max(1) as usize)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Re-pack into a base64 + zlib payload that decodes to the same cells
    pub fn encode_payload(&self) -> Result<String, MapError> {
        let mut bytes = Vec::with_capacity(self.tiles.len() * BYTES_PER_GID);
        for tile in &self.tiles {
            bytes.extend_from_slice(&tile.to_raw().to_le_bytes());
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&bytes)
            .map_err(|e| MapError::corrupt_layer(&self.name, format!("deflate error: {e}")))?;
        let compressed = encoder
            .finish()
            .map_err(|e| MapError::corrupt_layer(&self.name, format!("deflate error: {e}")))?;

        Ok(BASE64.encode(compressed))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Layer {
    /// Decode this layer's payload into a grid, resolving tilesets
    pub fn decode(&self, tilesets: &[MapTileset]) -> Result<TileGrid, MapError> {
        let raw = decode_raw_gids(&self.data, &self.name, self.width, self.height)?;
        let tiles = raw
            .into_iter()
            .map(|gid| DecodedTile::resolve(gid, tilesets))
            .collect();

        Ok(TileGrid {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            tiles,
        })
    }
}

/// Decode a `<data>` payload into packed u32 gids (flip bits still set)
pub fn decode_raw_gids(
    data: &LayerData,
    layer: &str,
    width: u32,
    height: u32,
) -> Result<Vec<u32>, MapError> {
    if width == 0 || height == 0 {
        return Err(MapError::InvalidDimensions {
            target: format!("layer '{layer}'"),
            width,
            height,
        });
    }
    if data.encoding != ENCODING_BASE64 {
        return Err(MapError::UnsupportedEncoding(data.encoding.clone()));
    }
    let compression = data.compression.as_deref().unwrap_or("none");
    if compression != COMPRESSION_ZLIB {
        return Err(MapError::UnsupportedCompression(compression.to_string()));
    }

    let expected = width as usize * height as usize * BYTES_PER_GID;

    let text: String = data.payload.split_whitespace().collect();
    let compressed = BASE64
        .decode(text.as_bytes())
        .map_err(|e| MapError::corrupt_layer(layer, format!("base64 error: {e}")))?;

    // One byte past the grid size is enough to detect an overlong stream
    let mut bytes = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(expected as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| MapError::corrupt_layer(layer, format!("zlib error: {e}")))?;

    if bytes.len() > expected {
        return Err(MapError::corrupt_layer(
            layer,
            format!("expected {expected} bytes, stream is longer"),
        ));
    }
    if bytes.len() < expected {
        return Err(MapError::corrupt_layer(
            layer,
            format!("expected {expected} bytes, got {}", bytes.len()),
        ));
    }

    debug!(layer, width, height, "decoded tile layer payload");

    Ok(bytes
        .chunks_exact(BYTES_PER_GID)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zlib_base64(raw: &[u32]) -> String {
        let mut bytes = Vec::new();
        for gid in raw {
            bytes.extend_from_slice(&gid.to_le_bytes());
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes).unwrap();
        BASE64.encode(encoder.finish().unwrap())
    }

    fn layer(width: u32, height: u32, payload: String) -> Layer {
        Layer {
            name: "ground".into(),
            width,
            height,
            data: LayerData {
                encoding: "base64".into(),
                compression: Some("zlib".into()),
                payload,
            },
        }
    }

    fn tilesets() -> Vec<MapTileset> {
        [1, 65]
            .into_iter()
            .map(|first_gid| MapTileset {
                first_gid,
                source: None,
                name: String::new(),
                tile_width: Some(64),
                tile_height: Some(32),
                images: Vec::new(),
                tiles: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_flag_extraction() {
        let tile = DecodedTile::from_raw(0xA000_0001);
        assert_eq!(tile.gid, 1);
        assert!(tile.flip_horizontal);
        assert!(!tile.flip_vertical);
        assert!(tile.flip_diagonal);
        assert_eq!(tile.to_raw(), 0xA000_0001);
    }

    #[test]
    fn test_decode_layer() {
        let raw = [0, 1, 0x8000_0002, 66, 70, 0x4000_0041];
        let grid = layer(3, 2, zlib_base64(&raw)).decode(&tilesets()).unwrap();

        assert_eq!(grid.len(), 6);
        assert!(grid.get(0, 0).unwrap().is_empty());
        assert_eq!(grid.get(0, 0).unwrap().tileset, None);
        assert_eq!(grid.get(1, 0).unwrap().tileset, Some(0));

        let flipped = grid.get(2, 0).unwrap();
        assert_eq!(flipped.gid, 2);
        assert!(flipped.flip_horizontal);

        assert_eq!(grid.get(0, 1).unwrap().tileset, Some(1));
        let last = grid.get(2, 1).unwrap();
        assert_eq!(last.gid, 65);
        assert!(last.flip_vertical);
        assert_eq!(last.tileset, Some(1));

        assert!(grid.get(3, 0).is_none());
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn test_whitespace_padded_payload() {
        let payload = format!("\n   {}\n  ", zlib_base64(&[5, 6, 7, 8]));
        let grid = layer(2, 2, payload).decode(&tilesets()).unwrap();
        assert_eq!(grid.tiles.iter().map(|t| t.gid).collect::<Vec<_>>(), [5, 6, 7, 8]);
    }

    #[test]
    fn test_encode_round_trip() {
        let raw = [0, 1, 0xE000_0003, 0x2000_0004];
        let grid = layer(2, 2, zlib_base64(&raw)).decode(&tilesets()).unwrap();

        let reencoded = layer(2, 2, grid.encode_payload().unwrap());
        let again = reencoded.decode(&tilesets()).unwrap();
        assert_eq!(again.tiles, grid.tiles);
        assert_eq!(
            decode_raw_gids(&reencoded.data, "ground", 2, 2).unwrap(),
            raw.to_vec()
        );
    }

    #[test]
    fn test_length_mismatch_is_corrupt() {
        let err = layer(3, 3, zlib_base64(&[1, 2, 3])).decode(&tilesets()).unwrap_err();
        assert!(matches!(err, MapError::CorruptLayerData { .. }));
        assert!(err.to_string().contains("expected 36 bytes, got 12"));
    }

    #[test]
    fn test_oversized_stream_stops_at_grid_size() {
        // 16 MiB of zeros inflating into a 1x1 layer
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&vec![0u8; 16 << 20]).unwrap();
        let payload = BASE64.encode(encoder.finish().unwrap());

        let data = LayerData {
            encoding: "base64".into(),
            compression: Some("zlib".into()),
            payload,
        };
        let err = decode_raw_gids(&data, "bomb", 1, 1).unwrap_err();
        assert!(matches!(err, MapError::CorruptLayerData { .. }));
        assert!(err.to_string().contains("expected 4 bytes, stream is longer"));
    }

    #[test]
    fn test_one_extra_gid_is_corrupt() {
        let err = layer(2, 1, zlib_base64(&[1, 2, 3])).decode(&tilesets()).unwrap_err();
        assert!(err.to_string().contains("expected 8 bytes, stream is longer"));
    }

    #[test]
    fn test_bad_base64_is_corrupt() {
        let err = layer(1, 1, "!!!not base64!!!".into()).decode(&tilesets()).unwrap_err();
        assert!(matches!(err, MapError::CorruptLayerData { .. }));
    }

    #[test]
    fn test_bad_zlib_stream_is_corrupt() {
        let err = layer(1, 1, BASE64.encode([1u8, 2, 3, 4]))
            .decode(&tilesets())
            .unwrap_err();
        assert!(matches!(err, MapError::CorruptLayerData { .. }));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = layer(0, 4, zlib_base64(&[])).decode(&tilesets()).unwrap_err();
        assert!(matches!(err, MapError::InvalidDimensions { width: 0, height: 4, .. }));
        let err = layer(4, 0, zlib_base64(&[])).decode(&tilesets()).unwrap_err();
        assert!(matches!(err, MapError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_unsupported_compression() {
        let mut gzip = layer(1, 1, zlib_base64(&[1]));
        gzip.data.compression = Some("gzip".into());
        assert!(matches!(
            gzip.decode(&tilesets()),
            Err(MapError::UnsupportedCompression(c)) if c == "gzip"
        ));

        let mut plain = layer(1, 1, zlib_base64(&[1]));
        plain.data.compression = None;
        assert!(matches!(
            plain.decode(&tilesets()),
            Err(MapError::UnsupportedCompression(c)) if c == "none"
        ));
    }

    #[test]
    fn test_unsupported_encoding() {
        let mut csv = layer(1, 1, "1".into());
        csv.data.encoding = "csv".into();
        assert!(matches!(csv.decode(&tilesets()), Err(MapError::UnsupportedEncoding(_))));
    }
}
