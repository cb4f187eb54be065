//! Layer reconciliation, the heart of the composition service.
//!
//! [`merge_layers`] folds an ordered batch of incoming layers into a
//! project's existing collection, keyed by layer name:
//!
//! 1. no layer of that name exists → the incoming layer is **added**;
//! 2. a layer of that name exists with the same source → the existing
//!    layer is **kept** and stays authoritative;
//! 3. a layer of that name exists with a different source → the existing
//!    layer and its precision entry are dropped and the incoming layer
//!    **replaces** it.
//!
//! [`rebuild_exposure`] then rewrites the service-exposure lists from the
//! full post-merge collection, so the `WFSLayers`/`WCSLayers` properties
//! and per-layer precision entries always describe exactly the layers the
//! project contains.

use tracing::{debug, info};

use crate::layer::{Layer, LayerId};
use crate::project::Project;

/// Property scope listing vector layer ids exposed over WFS.
pub const WFS_LAYERS: &str = "WFSLayers";

/// Property scope listing raster layer ids exposed over WCS.
pub const WCS_LAYERS: &str = "WCSLayers";

/// Property scope holding per-vector-layer coordinate precision.
pub const WFS_PRECISION: &str = "WFSLayersPrecision";

/// Decision taken for one incoming layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No layer of this name existed; the incoming layer was added.
    Added,
    /// A layer of this name with an identical source existed; it was kept.
    Kept,
    /// A layer of this name with a different source existed; it was
    /// removed and the incoming layer took its place.
    Replaced,
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MergeOutcome::Added => "added",
            MergeOutcome::Kept => "kept",
            MergeOutcome::Replaced => "replaced",
        };
        f.write_str(s)
    }
}

/// One record per incoming layer, in request order.
#[derive(Debug, Clone)]
pub struct MergeRecord {
    pub name: String,
    pub outcome: MergeOutcome,
    /// Id of the layer that represents this name after the merge.
    pub id: LayerId,
}

/// Outcome of a whole merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub records: Vec<MergeRecord>,
}

impl MergeReport {
    pub fn added(&self) -> usize {
        self.count(MergeOutcome::Added)
    }

    pub fn kept(&self) -> usize {
        self.count(MergeOutcome::Kept)
    }

    pub fn replaced(&self) -> usize {
        self.count(MergeOutcome::Replaced)
    }

    fn count(&self, outcome: MergeOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    fn push(&mut self, name: &str, outcome: MergeOutcome, id: LayerId) {
        self.records.push(MergeRecord {
            name: name.to_string(),
            outcome,
            id,
        });
    }
}

/// Merge incoming layers into the project, name-keyed, in one pass.
///
/// Replacement removes the outgoing layer's `WFSLayersPrecision` entry in
/// the same step; the remaining exposure bookkeeping happens afterwards in
/// [`rebuild_exposure`]. A batch that mentions the same (name, source)
/// twice resolves to a single added layer followed by a keep.
pub fn merge_layers(project: &mut Project, incoming: Vec<Layer>) -> MergeReport {
    let mut report = MergeReport::default();

    for layer in incoming {
        let existing = project
            .layer_by_name(&layer.name)
            .map(|l| (l.id.clone(), l.source.clone()));

        match existing {
            None => {
                let id = layer.id.clone();
                let name = layer.name.clone();
                let outcome = insert_or_keep(project, layer, MergeOutcome::Added);
                debug!(layer = %name, id = %id, outcome = %outcome, "layer merged");
                report.push(&name, outcome, id);
            }
            Some((existing_id, existing_source)) => {
                if existing_source == layer.source {
                    debug!(layer = %layer.name, id = %existing_id, "layer unchanged");
                    report.push(&layer.name, MergeOutcome::Kept, existing_id);
                } else {
                    info!(layer = %layer.name, "source changed, replacing layer");
                    project.remove_entry(WFS_PRECISION, existing_id.as_str());
                    project.remove_layer(&existing_id);
                    let id = layer.id.clone();
                    let name = layer.name.clone();
                    let outcome = insert_or_keep(project, layer, MergeOutcome::Replaced);
                    report.push(&name, outcome, id);
                }
            }
        }
    }

    report
}

/// Insert `layer`, downgrading to [`MergeOutcome::Kept`] when an identical
/// layer is already present.
///
/// Ids are content-derived, so a duplicate id means the project already
/// holds this exact (name, source) pair, possible when the collection
/// carries duplicate names and name-lookup matched a different one.
fn insert_or_keep(project: &mut Project, layer: Layer, outcome: MergeOutcome) -> MergeOutcome {
    match project.add_layer(layer) {
        Ok(()) => outcome,
        Err(_) => MergeOutcome::Kept,
    }
}

/// Rewrite the exposure lists from the full post-merge collection.
///
/// Every vector layer id lands in `WFSLayers` with a
/// `WFSLayersPrecision/<id>` entry set to `precision`; every raster layer
/// id lands in `WCSLayers`. Stale precision entries are dropped. An empty
/// list removes the property entirely rather than leaving an empty entry.
pub fn rebuild_exposure(project: &mut Project, precision: i64) {
    let vector_ids: Vec<String> = project
        .layers()
        .iter()
        .filter(|l| l.is_vector())
        .map(|l| l.id.as_str().to_string())
        .collect();
    let raster_ids: Vec<String> = project
        .layers()
        .iter()
        .filter(|l| l.is_raster())
        .map(|l| l.id.as_str().to_string())
        .collect();

    project.remove_scope(WFS_PRECISION);
    for id in &vector_ids {
        project.write_entry(WFS_PRECISION, id, precision);
    }

    if vector_ids.is_empty() {
        project.remove_entry(WFS_LAYERS, "");
    } else {
        project.write_entry(WFS_LAYERS, "", vector_ids);
    }

    if raster_ids.is_empty() {
        project.remove_entry(WCS_LAYERS, "");
    } else {
        project.write_entry(WCS_LAYERS, "", raster_ids);
    }
}
