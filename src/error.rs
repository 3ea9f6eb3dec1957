//! Fatal load errors.
//!
//! Anything in here aborts the whole load: a malformed map asset is a
//! deployment defect, not something to recover from at runtime. Per-object
//! annotation mismatches are not errors; see `collider::AnnotationIssue`.

/// Error type for map and tileset loading
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Malformed document: {0}")]
    DocumentMalformed(String),
    #[error("Malformed polyline \"{points}\": {reason}")]
    MalformedPolyline { points: String, reason: String },
    #[error("Unsupported layer encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("Unsupported layer compression: {0}")]
    UnsupportedCompression(String),
    #[error("Corrupt data in layer '{layer}': {reason}")]
    CorruptLayerData { layer: String, reason: String },
    #[error("Invalid dimensions for {target}: {width}x{height}")]
    InvalidDimensions {
        target: String,
        width: u32,
        height: u32,
    },
    #[error("Unsupported map orientation: {0}")]
    UnsupportedOrientation(String),
    #[error("No document supplied for external tileset: {0}")]
    UnresolvedTileset(String),
    #[error("Invalid pipeline config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<quick_xml::DeError> for MapError {
    fn from(err: quick_xml::DeError) -> Self {
        MapError::DocumentMalformed(err.to_string())
    }
}

impl MapError {
    pub(crate) fn corrupt_layer(layer: &str, reason: impl Into<String>) -> Self {
        MapError::CorruptLayerData {
            layer: layer.to_string(),
            reason: reason.into(),
        }
    }
}
