//! Project document: ordered layer collection plus a property tree.
//!
//! A project is the artifact the composition service builds and updates.
//! It owns an ordered list of layers (insertion order is meaningful: it is
//! the draw order a host server would use) and a flat property map holding
//! the service-exposure lists and per-layer settings.
//!
//! # Example
//!
//! ```
//! use mapcomposition::layer::Layer;
//! use mapcomposition::project::Project;
//! use mapcomposition::source::LayerSource;
//!
//! let source = LayerSource::parse("type=xyz&url=http://tile.osm.org/{z}.png").unwrap();
//! let mut project = Project::new("/tmp/doc-example.json");
//! project.add_layer(Layer::from_source("basemap", &source)).unwrap();
//! assert_eq!(project.layers().len(), 1);
//! ```

mod persist;
mod properties;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::{Layer, LayerId};

pub use properties::PropertyValue;

/// Version written into every project document.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Errors reading, writing, or mutating a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode project document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode project document {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("project format version '{found}' is not compatible with {FORMAT_VERSION}")]
    IncompatibleVersion { found: String },

    #[error("layer id '{0}' already present in project")]
    DuplicateLayerId(LayerId),
}

/// Serialized form of a project.
#[derive(Debug, Serialize, Deserialize)]
struct ProjectDocument {
    format_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    layers: Vec<Layer>,
    properties: BTreeMap<String, PropertyValue>,
}

/// A project bound to a file path.
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    layers: Vec<Layer>,
    properties: BTreeMap<String, PropertyValue>,
    saved_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project bound to `path`. Nothing is written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layers: Vec::new(),
            properties: BTreeMap::new(),
            saved_at: None,
        }
    }

    /// Read a project document from disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or decoded, or when its format
    /// version has a different major than [`FORMAT_VERSION`].
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let path = path.into();
        let document = persist::read_document(&path)?;

        let current = Version::parse(FORMAT_VERSION).expect("valid format version constant");
        let found = Version::parse(&document.format_version).map_err(|_| {
            ProjectError::IncompatibleVersion {
                found: document.format_version.clone(),
            }
        })?;
        if found.major != current.major {
            return Err(ProjectError::IncompatibleVersion {
                found: document.format_version,
            });
        }

        Ok(Self {
            path,
            layers: document.layers,
            properties: document.properties,
            saved_at: document.saved_at,
        })
    }

    /// Write the project document to its bound path.
    pub fn write(&mut self) -> Result<(), ProjectError> {
        self.saved_at = Some(Utc::now());
        let document = ProjectDocument {
            format_version: FORMAT_VERSION.to_string(),
            saved_at: self.saved_at,
            layers: self.layers.clone(),
            properties: self.properties.clone(),
        };
        persist::write_document(&self.path, &document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Ordered layer collection.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Append a layer.
    ///
    /// # Errors
    ///
    /// Fails when a layer with the same id is already present.
    pub fn add_layer(&mut self, layer: Layer) -> Result<(), ProjectError> {
        if self.layers.iter().any(|l| l.id == layer.id) {
            return Err(ProjectError::DuplicateLayerId(layer.id));
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Remove a layer by id, returning it when present.
    pub fn remove_layer(&mut self, id: &LayerId) -> Option<Layer> {
        let index = self.layers.iter().position(|l| &l.id == id)?;
        Some(self.layers.remove(index))
    }

    /// First layer with the given name, in collection order.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Write a scoped property entry.
    pub fn write_entry(&mut self, scope: &str, key: &str, value: impl Into<PropertyValue>) {
        self.properties
            .insert(properties::entry_key(scope, key), value.into());
    }

    /// Read a scoped property entry.
    pub fn read_entry(&self, scope: &str, key: &str) -> Option<&PropertyValue> {
        self.properties.get(&properties::entry_key(scope, key))
    }

    /// Remove a scoped property entry. Returns true when one was removed.
    pub fn remove_entry(&mut self, scope: &str, key: &str) -> bool {
        self.properties
            .remove(&properties::entry_key(scope, key))
            .is_some()
    }

    /// Remove every entry under a scope. Returns the number removed.
    pub fn remove_scope(&mut self, scope: &str) -> usize {
        let prefix = format!("{}/", scope);
        let before = self.properties.len();
        self.properties.retain(|k, _| !k.starts_with(&prefix));
        before - self.properties.len()
    }

    /// Drop all layers and properties, keeping the path binding.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.properties.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LayerSource;
    use tempfile::TempDir;

    fn layer(name: &str, source: &str) -> Layer {
        Layer::from_source(name, &LayerSource::parse(source).unwrap())
    }

    #[test]
    fn test_add_and_lookup() {
        let mut project = Project::new("/tmp/p.json");
        project.add_layer(layer("rivers", "/data/rivers.shp")).unwrap();
        project.add_layer(layer("relief", "/data/relief.tif")).unwrap();

        assert_eq!(project.layers().len(), 2);
        assert_eq!(project.layer_by_name("rivers").unwrap().source, "/data/rivers.shp");
        assert!(project.layer_by_name("missing").is_none());
    }

    #[test]
    fn test_add_duplicate_id_rejected() {
        let mut project = Project::new("/tmp/p.json");
        project.add_layer(layer("rivers", "/data/rivers.shp")).unwrap();
        let err = project
            .add_layer(layer("rivers", "/data/rivers.shp"))
            .unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateLayerId(_)));
    }

    #[test]
    fn test_remove_layer() {
        let mut project = Project::new("/tmp/p.json");
        let l = layer("rivers", "/data/rivers.shp");
        let id = l.id.clone();
        project.add_layer(l).unwrap();

        let removed = project.remove_layer(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(project.is_empty());
        assert!(project.remove_layer(&id).is_none());
    }

    #[test]
    fn test_property_entries() {
        let mut project = Project::new("/tmp/p.json");
        project.write_entry("WFSLayersPrecision", "abc", 8);
        assert_eq!(
            project.read_entry("WFSLayersPrecision", "abc").and_then(PropertyValue::as_int),
            Some(8)
        );

        assert!(project.remove_entry("WFSLayersPrecision", "abc"));
        assert!(!project.remove_entry("WFSLayersPrecision", "abc"));
    }

    #[test]
    fn test_remove_scope() {
        let mut project = Project::new("/tmp/p.json");
        project.write_entry("WFSLayersPrecision", "a", 8);
        project.write_entry("WFSLayersPrecision", "b", 8);
        project.write_entry("WFSLayers", "", vec!["a".to_string()]);

        assert_eq!(project.remove_scope("WFSLayersPrecision"), 2);
        assert!(project.read_entry("WFSLayers", "").is_some());
    }

    #[test]
    fn test_round_trip_plain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.json");

        let mut project = Project::new(&path);
        project.add_layer(layer("rivers", "/data/rivers.shp")).unwrap();
        project.write_entry("WFSLayers", "", vec!["x".to_string()]);
        project.write().unwrap();

        let loaded = Project::read(&path).unwrap();
        assert_eq!(loaded.layers(), project.layers());
        assert_eq!(
            loaded.read_entry("WFSLayers", "").and_then(|v| v.as_list()).map(<[String]>::len),
            Some(1)
        );
        assert!(loaded.saved_at().is_some());
    }

    #[test]
    fn test_round_trip_compressed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.qgz");

        let mut project = Project::new(&path);
        project.add_layer(layer("relief", "/data/relief.tif")).unwrap();
        project.write().unwrap();

        // Compressed on disk: not valid JSON when read raw
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let loaded = Project::read(&path).unwrap();
        assert_eq!(loaded.layers().len(), 1);
    }

    #[test]
    fn test_read_rejects_incompatible_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(
            &path,
            r#"{"format_version":"2.0.0","layers":[],"properties":{}}"#,
        )
        .unwrap();

        let err = Project::read(&path).unwrap_err();
        assert!(matches!(err, ProjectError::IncompatibleVersion { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = Project::read("/nonexistent/project.json").unwrap_err();
        assert!(matches!(err, ProjectError::Io { .. }));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.json");

        let mut project = Project::new(&path);
        project.write().unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("project.json")]);
    }

    #[test]
    fn test_clear() {
        let mut project = Project::new("/tmp/p.json");
        project.add_layer(layer("rivers", "/data/rivers.shp")).unwrap();
        project.write_entry("WFSLayers", "", vec!["x".to_string()]);

        project.clear();
        assert!(project.is_empty());
        assert!(project.read_entry("WFSLayers", "").is_none());
        assert_eq!(project.path(), Path::new("/tmp/p.json"));
    }
}
