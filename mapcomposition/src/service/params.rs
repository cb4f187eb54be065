//! Composition request parameters.
//!
//! Grammar:
//!
//! ```text
//! SERVICE=MAPCOMPOSITION&
//! PROJECT=/destination/project.json&
//! SOURCES=type=xyz&url=http://tile.osm.org/{z}/{x}/{y}.png;/path/1.shp;/path/2.asc&
//! NAMES=basemap;Layer 1;Layer 2&
//! OVERWRITE=true&
//! REMOVEQML=true
//! ```
//!
//! `FILES` is honored as a legacy alias when `SOURCES` is absent. Flags
//! accept `1`/`YES`/`TRUE` (any case) as true; anything else is false.

use std::path::PathBuf;

use crate::source::LayerSource;

use super::{ServiceError, ServiceRequest};

/// Separator between sources and between names.
const LIST_SEPARATOR: char = ';';

/// Parse a flag parameter value.
pub fn parse_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(v.to_uppercase().as_str(), "1" | "YES" | "TRUE"),
        None => false,
    }
}

/// A validated composition request.
#[derive(Debug, Clone)]
pub struct ComposeParams {
    pub project_path: PathBuf,
    /// Parsed sources, paired with their display names, in request order.
    pub layers: Vec<(String, LayerSource)>,
    pub overwrite: bool,
    pub remove_qml: bool,
}

impl ComposeParams {
    /// Extract and validate parameters from a request.
    ///
    /// # Errors
    ///
    /// Any violation of the parameter grammar: missing `PROJECT` or
    /// `SOURCES`/`FILES`, an unparsable source, or a `NAMES` list whose
    /// length differs from the sources list.
    pub fn from_request(request: &ServiceRequest) -> Result<Self, ServiceError> {
        let project_path = request
            .get("PROJECT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(ServiceError::MissingParameter("PROJECT"))?;

        let sources_raw = request
            .get("SOURCES")
            .filter(|v| !v.is_empty())
            .or_else(|| request.get("FILES").filter(|v| !v.is_empty()))
            .ok_or(ServiceError::MissingParameter("SOURCES"))?;

        let sources: Vec<LayerSource> = sources_raw
            .split(LIST_SEPARATOR)
            .map(|raw| {
                LayerSource::parse(raw).map_err(|reason| ServiceError::InvalidSource {
                    src: raw.to_string(),
                    reason,
                })
            })
            .collect::<Result<_, _>>()?;

        let names: Vec<String> = match request.get("NAMES").filter(|v| !v.is_empty()) {
            Some(names_raw) => {
                let names: Vec<String> = names_raw
                    .split(LIST_SEPARATOR)
                    .map(str::to_string)
                    .collect();
                if names.len() != sources.len() {
                    return Err(ServiceError::NameCountMismatch {
                        names: names.len(),
                        sources: sources.len(),
                    });
                }
                names
            }
            None => sources.iter().map(LayerSource::default_name).collect(),
        };

        let overwrite = parse_flag(request.get("OVERWRITE"));
        let remove_qml = parse_flag(request.get("REMOVEQML"));

        Ok(Self {
            project_path,
            layers: names.into_iter().zip(sources).collect(),
            overwrite,
            remove_qml,
        })
    }

    /// Ensure every file source exists on disk.
    ///
    /// Kept separate from parsing so unit tests can build params for
    /// paths that do not exist.
    pub fn check_sources_exist(&self) -> Result<(), ServiceError> {
        for (_, source) in &self.layers {
            if let Some(path) = source.path() {
                if !path.exists() {
                    return Err(ServiceError::FileNotFound(source.raw().to_string()));
                }
            }
        }
        Ok(())
    }
}
