//! The MAPCOMPOSITION service: build or update a project from sources.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::compose::{merge_layers, rebuild_exposure, MergeReport};
use crate::engine::{DefaultLayerBuilder, LayerBuilder};
use crate::layer::Layer;
use crate::legend::{write_legends, LegendRenderer, SwatchRenderer};
use crate::project::Project;

use super::{ComposeParams, MapService, Method, ServiceError, ServiceRequest, ServiceResponse};

/// Default coordinate precision written for WFS-exposed layers.
pub const DEFAULT_WFS_PRECISION: i64 = 8;

/// Creates or updates a project with one layer per requested source.
///
/// The request cycle: validate parameters, load or create the project,
/// build one layer per source through the engine seam, merge by name,
/// rebuild the exposure lists, persist, write legends, and optionally
/// delete companion style files.
pub struct MapCompositionService {
    builder: Box<dyn LayerBuilder>,
    renderer: Box<dyn LegendRenderer>,
    wfs_precision: i64,
}

impl MapCompositionService {
    pub fn new() -> Self {
        Self {
            builder: Box::new(DefaultLayerBuilder),
            renderer: Box::new(SwatchRenderer::default()),
            wfs_precision: DEFAULT_WFS_PRECISION,
        }
    }

    /// Substitute the engine seam.
    pub fn with_builder(mut self, builder: Box<dyn LayerBuilder>) -> Self {
        self.builder = builder;
        self
    }

    /// Substitute the legend renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn LegendRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Override the WFS coordinate precision.
    pub fn with_wfs_precision(mut self, precision: i64) -> Self {
        self.wfs_precision = precision;
        self
    }

    /// Run one composition request against the filesystem.
    pub fn compose(&self, params: &ComposeParams) -> Result<MergeReport, ServiceError> {
        params.check_sources_exist()?;

        if params.overwrite && params.project_path.exists() {
            info!(project = %params.project_path.display(), "overwrite requested, removing existing project");
            fs::remove_file(&params.project_path).map_err(|e| {
                ServiceError::Project(crate::project::ProjectError::Io {
                    path: params.project_path.clone(),
                    source: e,
                })
            })?;
        }

        let mut project = if params.project_path.exists() {
            Project::read(&params.project_path)?
        } else {
            Project::new(&params.project_path)
        };

        let mut incoming: Vec<Layer> = Vec::with_capacity(params.layers.len());
        let mut companions: Vec<PathBuf> = Vec::new();
        for (name, source) in &params.layers {
            let mut layer = self.builder.build(name, source)?;
            layer.style.rename("", crate::layer::DEFAULT_STYLE_NAME);
            if let Some(companion) = source.style_companion() {
                if companion.exists() {
                    companions.push(companion);
                }
            }
            incoming.push(layer);
        }

        let report = merge_layers(&mut project, incoming);
        rebuild_exposure(&mut project, self.wfs_precision);

        project.write()?;
        if !project.path().is_file() {
            return Err(ServiceError::ProjectNotWritten(format!(
                "{} missing after write",
                project.path().display()
            )));
        }

        let legends = write_legends(self.renderer.as_ref(), project.layers(), project.path());

        if params.remove_qml {
            for companion in &companions {
                match fs::remove_file(companion) {
                    Ok(()) => info!(path = %companion.display(), "removed companion style file"),
                    Err(e) => {
                        warn!(path = %companion.display(), error = %e, "failed to remove companion style file");
                    }
                }
            }
        }

        info!(
            project = %project.path().display(),
            added = report.added(),
            kept = report.kept(),
            replaced = report.replaced(),
            legends = legends.len(),
            "project composed"
        );

        Ok(report)
    }
}

impl Default for MapCompositionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MapService for MapCompositionService {
    fn name(&self) -> &'static str {
        "MAPCOMPOSITION"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn allow_method(&self, method: Method) -> bool {
        method == Method::Get
    }

    fn execute(&self, request: &ServiceRequest) -> ServiceResponse {
        let params = match ComposeParams::from_request(request) {
            Ok(params) => params,
            Err(e) => return e.into(),
        };

        match self.compose(&params) {
            Ok(_) => ServiceResponse::ok("OK"),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{WCS_LAYERS, WFS_LAYERS, WFS_PRECISION};
    use crate::engine::tests::RejectingBuilder;
    use crate::project::PropertyValue;
    use crate::service::Method;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn request(pairs: &[(&str, &str)]) -> ServiceRequest {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceRequest::new(Method::Get, params)
    }

    fn touch(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, "stub").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_execute_creates_project() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        let response = service.execute(&request(&[
            ("SERVICE", "MAPCOMPOSITION"),
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &shp),
        ]));

        assert_eq!(response.status, 200, "body: {}", response.body);
        assert_eq!(response.body, "OK");
        assert!(project_path.is_file());

        let project = Project::read(&project_path).unwrap();
        assert_eq!(project.layers().len(), 1);
        assert_eq!(
            project
                .read_entry(WFS_LAYERS, "")
                .and_then(PropertyValue::as_list)
                .map(<[String]>::len),
            Some(1)
        );
    }

    #[test]
    fn test_execute_missing_project_param() {
        let service = MapCompositionService::new();
        let response = service.execute(&request(&[("SOURCES", "/data/rivers.shp")]));
        assert_eq!(response.status, 400);
        assert!(response.body.contains("PROJECT"));
    }

    #[test]
    fn test_execute_missing_file() {
        let dir = TempDir::new().unwrap();
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        let response = service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", "/nonexistent/rivers.shp"),
        ]));
        assert_eq!(response.status, 400);
        assert!(response.body.contains("file not found"));
        assert!(!project_path.exists());
    }

    #[test]
    fn test_execute_rejecting_engine_is_400() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new().with_builder(Box::new(RejectingBuilder));
        let response = service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &shp),
        ]));
        assert_eq!(response.status, 400);
        assert!(response.body.contains("not valid"));
    }

    #[test]
    fn test_update_replaces_changed_source() {
        let dir = TempDir::new().unwrap();
        let shp_v1 = touch(&dir, "rivers.shp");
        let shp_v2 = touch(&dir, "rivers_v2.shp");
        let project_path = dir.path().join("project.json");
        let project_param = project_path.to_str().unwrap().to_string();

        let service = MapCompositionService::new();
        let first = service.execute(&request(&[
            ("PROJECT", &project_param),
            ("SOURCES", &shp_v1),
            ("NAMES", "rivers"),
        ]));
        assert_eq!(first.status, 200);
        let old_id = Project::read(&project_path).unwrap().layers()[0].id.clone();

        let second = service.execute(&request(&[
            ("PROJECT", &project_param),
            ("SOURCES", &shp_v2),
            ("NAMES", "rivers"),
        ]));
        assert_eq!(second.status, 200);

        let project = Project::read(&project_path).unwrap();
        assert_eq!(project.layers().len(), 1);
        assert_ne!(project.layers()[0].id, old_id);
        assert!(project.read_entry(WFS_PRECISION, old_id.as_str()).is_none());
    }

    #[test]
    fn test_overwrite_discards_existing_layers() {
        let dir = TempDir::new().unwrap();
        let rivers = touch(&dir, "rivers.shp");
        let roads = touch(&dir, "roads.shp");
        let project_path = dir.path().join("project.json");
        let project_param = project_path.to_str().unwrap().to_string();

        let service = MapCompositionService::new();
        service.execute(&request(&[("PROJECT", &project_param), ("SOURCES", &rivers)]));
        let response = service.execute(&request(&[
            ("PROJECT", &project_param),
            ("SOURCES", &roads),
            ("OVERWRITE", "true"),
        ]));
        assert_eq!(response.status, 200);

        let project = Project::read(&project_path).unwrap();
        assert_eq!(project.layers().len(), 1);
        assert_eq!(project.layers()[0].name, "roads");
    }

    #[test]
    fn test_legends_written_for_all_layers() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let tif = touch(&dir, "relief.tif");
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        let response = service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &format!("{};{}", shp, tif)),
        ]));
        assert_eq!(response.status, 200);

        assert!(dir.path().join("project_legend_rivers.png").is_file());
        assert!(dir.path().join("project_legend_relief.png").is_file());
    }

    #[test]
    fn test_remove_qml_deletes_companion() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let qml = dir.path().join("rivers.qml");
        std::fs::write(&qml, "<qml/>").unwrap();
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        let response = service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &shp),
            ("REMOVEQML", "true"),
        ]));
        assert_eq!(response.status, 200);
        assert!(!qml.exists());
    }

    #[test]
    fn test_companion_kept_without_flag() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let qml = dir.path().join("rivers.qml");
        std::fs::write(&qml, "<qml/>").unwrap();
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &shp),
        ]));
        assert!(qml.exists());
    }

    #[test]
    fn test_raster_goes_to_wcs_list() {
        let dir = TempDir::new().unwrap();
        let tif = touch(&dir, "relief.tif");
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new();
        service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &tif),
        ]));

        let project = Project::read(&project_path).unwrap();
        assert!(project.read_entry(WFS_LAYERS, "").is_none());
        assert_eq!(
            project
                .read_entry(WCS_LAYERS, "")
                .and_then(PropertyValue::as_list)
                .map(<[String]>::len),
            Some(1)
        );
    }

    #[test]
    fn test_custom_precision() {
        let dir = TempDir::new().unwrap();
        let shp = touch(&dir, "rivers.shp");
        let project_path = dir.path().join("project.json");

        let service = MapCompositionService::new().with_wfs_precision(6);
        service.execute(&request(&[
            ("PROJECT", project_path.to_str().unwrap()),
            ("SOURCES", &shp),
        ]));

        let project = Project::read(&project_path).unwrap();
        let id = project.layers()[0].id.clone();
        assert_eq!(
            project
                .read_entry(WFS_PRECISION, id.as_str())
                .and_then(PropertyValue::as_int),
            Some(6)
        );
    }

    #[test]
    fn test_service_identity() {
        let service = MapCompositionService::new();
        assert_eq!(service.name(), "MAPCOMPOSITION");
        assert_eq!(service.version(), "1.0.0");
        assert!(service.allow_method(Method::Get));
        assert!(!service.allow_method(Method::Post));
    }
}
