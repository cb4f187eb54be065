//! Data source URI parsing and classification.
//!
//! A source string is either a filesystem path (`/data/rivers.shp`) or a
//! key=value descriptor for a remote service
//! (`type=xyz&url=http://tile.osm.org/{z}/{x}/{y}.png`). This module is the
//! single place that decides which of the two a raw string is, what kind of
//! layer it produces, and what its companion style file would be called.
//!
//! Parsing is purely syntactic. Whether a file source actually exists on
//! disk is checked later, during request validation.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions recognized as vector data.
const VECTOR_EXTENSIONS: &[&str] = &[
    "shp", "geojson", "json", "gpkg", "kml", "tab", "sqlite", "csv",
];

/// File extensions recognized as raster data.
const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff", "asc", "vrt", "img", "jp2", "png", "jpg"];

/// Extension used by companion style files.
const STYLE_EXTENSION: &str = "qml";

/// Errors produced while parsing a source string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The source string was empty or whitespace.
    #[error("empty source string")]
    Empty,

    /// A service descriptor was missing a required key.
    #[error("source descriptor is missing the '{0}' key")]
    MissingKey(&'static str),

    /// A service descriptor segment was not a key=value pair.
    #[error("malformed descriptor segment '{0}'")]
    MalformedSegment(String),

    /// The descriptor `type` value is not a known service type.
    #[error("unknown service type '{0}'")]
    UnknownServiceType(String),

    /// The file extension does not map to a known format.
    #[error("unrecognized format: {0}")]
    UnknownFormat(String),
}

/// Whether a layer carries vector features or raster cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Vector,
    Raster,
}

/// A parsed and classified data source.
///
/// The original raw string is kept verbatim: source equality during project
/// reconciliation compares raw strings, so parsing must never normalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    /// A filesystem source such as a shapefile or a GeoTIFF.
    File {
        raw: String,
        path: PathBuf,
        kind: SourceKind,
    },

    /// A remote service source described by key=value pairs.
    Service {
        raw: String,
        service_type: String,
        url: String,
        layers: Option<String>,
        kind: SourceKind,
    },
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9_]+)=(.*)$").expect("static regex"))
}

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"://([^/:?]+)").expect("static regex"))
}

impl LayerSource {
    /// Parse and classify a single raw source string.
    ///
    /// Strings containing `=` are treated as service descriptors and must
    /// carry `type` and `url` keys; everything else is a file path whose
    /// extension decides the layer kind.
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceError::Empty);
        }

        if trimmed.contains('=') {
            Self::parse_descriptor(trimmed)
        } else {
            Self::parse_file(trimmed)
        }
    }

    fn parse_descriptor(raw: &str) -> Result<Self, SourceError> {
        let mut service_type = None;
        let mut url = None;
        let mut layers = None;

        for segment in raw.split('&') {
            let captures = segment_regex()
                .captures(segment)
                .ok_or_else(|| SourceError::MalformedSegment(segment.to_string()))?;
            let key = captures[1].to_lowercase();
            let value = captures[2].to_string();
            match key.as_str() {
                "type" => service_type = Some(value),
                "url" => url = Some(value),
                "layers" => layers = Some(value),
                _ => {}
            }
        }

        let service_type = service_type.ok_or(SourceError::MissingKey("type"))?;
        let url = url.ok_or(SourceError::MissingKey("url"))?;

        let kind = match service_type.to_lowercase().as_str() {
            "xyz" | "wms" => SourceKind::Raster,
            "wfs" => SourceKind::Vector,
            other => return Err(SourceError::UnknownServiceType(other.to_string())),
        };

        Ok(LayerSource::Service {
            raw: raw.to_string(),
            service_type,
            url,
            layers,
            kind,
        })
    }

    fn parse_file(raw: &str) -> Result<Self, SourceError> {
        let path = PathBuf::from(raw);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| SourceError::UnknownFormat(raw.to_string()))?;

        let kind = if VECTOR_EXTENSIONS.contains(&extension.as_str()) {
            SourceKind::Vector
        } else if RASTER_EXTENSIONS.contains(&extension.as_str()) {
            SourceKind::Raster
        } else {
            return Err(SourceError::UnknownFormat(raw.to_string()));
        };

        Ok(LayerSource::File {
            raw: raw.to_string(),
            path,
            kind,
        })
    }

    /// The raw source string, exactly as received.
    pub fn raw(&self) -> &str {
        match self {
            LayerSource::File { raw, .. } | LayerSource::Service { raw, .. } => raw,
        }
    }

    /// The layer kind this source produces.
    pub fn kind(&self) -> SourceKind {
        match self {
            LayerSource::File { kind, .. } | LayerSource::Service { kind, .. } => *kind,
        }
    }

    /// True for filesystem sources.
    pub fn is_file(&self) -> bool {
        matches!(self, LayerSource::File { .. })
    }

    /// Filesystem path, for file sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LayerSource::File { path, .. } => Some(path),
            LayerSource::Service { .. } => None,
        }
    }

    /// Display name used when the request supplies none.
    ///
    /// File sources use the file stem. Service sources use the `layers`
    /// key when present, else the URL host, else the service type.
    pub fn default_name(&self) -> String {
        match self {
            LayerSource::File { path, .. } => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "layer".to_string()),
            LayerSource::Service {
                service_type,
                url,
                layers,
                ..
            } => {
                if let Some(layers) = layers {
                    if !layers.is_empty() {
                        return layers.clone();
                    }
                }
                host_regex()
                    .captures(url)
                    .map(|c| c[1].to_string())
                    .unwrap_or_else(|| service_type.clone())
            }
        }
    }

    /// Path of the companion style file (`.qml`) for file sources.
    pub fn style_companion(&self) -> Option<PathBuf> {
        match self {
            LayerSource::File { path, .. } => Some(path.with_extension(STYLE_EXTENSION)),
            LayerSource::Service { .. } => None,
        }
    }
}
