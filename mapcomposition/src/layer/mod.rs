//! Layer model and default styling.
//!
//! Layers are the unit the project document tracks: an identifier, a display
//! name, the raw source string, the kind (vector/raster), and a named style.
//! Construction assigns a deterministic id and a default style so that a
//! layer built twice from the same (name, source) pair is the same layer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::source::{LayerSource, SourceKind};

/// Number of id hash characters appended to the sanitized name.
const ID_HASH_LEN: usize = 10;

/// Name every style is normalized to once a layer enters a project.
pub const DEFAULT_STYLE_NAME: &str = "default";

/// Fill palette for default styling. Stroke colors are derived by darkening.
const PALETTE: &[[u8; 3]] = &[
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

/// Opaque layer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named style with fill and stroke colors (RGBA).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub name: String,
    pub fill: [u8; 4],
    pub stroke: [u8; 4],
}

impl LayerStyle {
    /// Default style for a layer, picked deterministically from the palette.
    ///
    /// Vector layers get a translucent fill with a darkened stroke; raster
    /// layers get an opaque ramp base color with a matching stroke.
    pub fn default_for(name: &str, kind: SourceKind) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let base = PALETTE[digest[0] as usize % PALETTE.len()];
        let stroke = [base[0] / 2, base[1] / 2, base[2] / 2, 255];
        let fill = match kind {
            SourceKind::Vector => [base[0], base[1], base[2], 160],
            SourceKind::Raster => [base[0], base[1], base[2], 255],
        };
        Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            fill,
            stroke,
        }
    }

    /// Rename the style if it currently carries `from`.
    ///
    /// Returns true when the rename applied. The unnamed style (`""`) is
    /// renamed to `"default"` when a layer is composed into a project.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if self.name == from {
            self.name = to.to_string();
            true
        } else {
            false
        }
    }
}

/// A project layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub source: String,
    pub kind: SourceKind,
    pub style: LayerStyle,
}

impl Layer {
    /// Build a layer from a parsed source with default styling.
    pub fn from_source(name: &str, source: &LayerSource) -> Self {
        let kind = source.kind();
        Self {
            id: layer_id(name, source.raw()),
            name: name.to_string(),
            source: source.raw().to_string(),
            kind,
            style: LayerStyle::default_for(name, kind),
        }
    }

    pub fn is_vector(&self) -> bool {
        self.kind == SourceKind::Vector
    }

    pub fn is_raster(&self) -> bool {
        self.kind == SourceKind::Raster
    }
}

/// Deterministic layer id: sanitized name plus a short content hash.
///
/// Same (name, source) always yields the same id; a changed source yields
/// a changed id. This is what lets reconciliation treat the id as a proxy
/// for layer identity across requests.
pub fn layer_id(name: &str, source: &str) -> LayerId {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    let mut hex: String = digest
        .iter()
        .take(ID_HASH_LEN.div_ceil(2))
        .map(|b| format!("{:02x}", b))
        .collect();
    hex.truncate(ID_HASH_LEN);
    LayerId(format!("{}_{}", sanitize(name), hex))
}

/// Lowercase and replace anything outside `[a-z0-9]` with underscores.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push_str("layer");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_source() -> LayerSource {
        LayerSource::parse("/data/rivers.shp").unwrap()
    }

    #[test]
    fn test_layer_id_deterministic() {
        let a = layer_id("Rivers", "/data/rivers.shp");
        let b = layer_id("Rivers", "/data/rivers.shp");
        assert_eq!(a, b);
    }

    #[test]
    fn test_layer_id_changes_with_source() {
        let a = layer_id("Rivers", "/data/rivers.shp");
        let b = layer_id("Rivers", "/data/rivers_v2.shp");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rivers_"));
        assert!(b.as_str().starts_with("rivers_"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Layer 1"), "layer_1");
        assert_eq!(sanitize("Ríos"), "r_os");
        assert_eq!(sanitize(""), "layer");
    }

    #[test]
    fn test_from_source_assigns_default_style() {
        let layer = Layer::from_source("Rivers", &vector_source());
        assert_eq!(layer.style.name, DEFAULT_STYLE_NAME);
        assert!(layer.is_vector());
        assert_eq!(layer.source, "/data/rivers.shp");
    }

    #[test]
    fn test_default_style_stable_per_name() {
        let a = LayerStyle::default_for("Rivers", SourceKind::Vector);
        let b = LayerStyle::default_for("Rivers", SourceKind::Vector);
        assert_eq!(a, b);
    }

    #[test]
    fn test_vector_fill_is_translucent() {
        let style = LayerStyle::default_for("Rivers", SourceKind::Vector);
        assert_eq!(style.fill[3], 160);

        let style = LayerStyle::default_for("Rivers", SourceKind::Raster);
        assert_eq!(style.fill[3], 255);
    }

    #[test]
    fn test_style_rename() {
        let mut style = LayerStyle::default_for("Rivers", SourceKind::Vector);
        style.name = String::new();
        assert!(style.rename("", DEFAULT_STYLE_NAME));
        assert_eq!(style.name, DEFAULT_STYLE_NAME);
        assert!(!style.rename("missing", "other"));
    }
}
