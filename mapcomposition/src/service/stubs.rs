//! Placeholder services kept on the registry surface.
//!
//! STYLEMANAGER and LAYERDEFINITION are registered so dispatch, method
//! gating, and capability listings see the full service set, but both
//! answer `501` until implemented.

use super::{MapService, ServiceRequest, ServiceResponse};

/// Style management service placeholder.
#[derive(Debug, Default)]
pub struct StyleManagerService;

impl MapService for StyleManagerService {
    fn name(&self) -> &'static str {
        "STYLEMANAGER"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn execute(&self, _request: &ServiceRequest) -> ServiceResponse {
        ServiceResponse::not_implemented("STYLEMANAGER is not implemented")
    }
}

/// Layer definition export service placeholder.
#[derive(Debug, Default)]
pub struct LayerDefinitionService;

impl MapService for LayerDefinitionService {
    fn name(&self) -> &'static str {
        "LAYERDEFINITION"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn execute(&self, _request: &ServiceRequest) -> ServiceResponse {
        ServiceResponse::not_implemented("LAYERDEFINITION is not implemented")
    }
}
