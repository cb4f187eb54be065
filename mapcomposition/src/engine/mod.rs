//! Seam to the host geospatial engine.
//!
//! Everything that requires understanding a source's payload (opening a
//! shapefile, probing a tile endpoint, reading bands) belongs behind
//! [`LayerBuilder`]. The crate itself never inspects payloads: the default
//! builder constructs layers from classification alone, which is all the
//! composition service needs. A deployment embedding a real engine
//! substitutes its own implementation.

use thiserror::Error;

use crate::layer::Layer;
use crate::source::LayerSource;

/// Errors from layer construction.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not produce a usable layer from the source.
    #[error("layer is not valid: {src}: {reason}")]
    InvalidLayer { src: String, reason: String },
}

/// Builds project layers from parsed sources.
pub trait LayerBuilder: Send + Sync {
    /// Construct a layer named `name` from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidLayer`] when the engine rejects the
    /// source.
    fn build(&self, name: &str, source: &LayerSource) -> Result<Layer, EngineError>;
}

/// Classification-only builder: trusts the parse, touches no payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayerBuilder;

impl LayerBuilder for DefaultLayerBuilder {
    fn build(&self, name: &str, source: &LayerSource) -> Result<Layer, EngineError> {
        Ok(Layer::from_source(name, source))
    }
}
