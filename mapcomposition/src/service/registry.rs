//! Name-keyed service registry.
//!
//! The host-server analog registers each service at plugin load and logs
//! the outcome per service; dispatch looks services up by the uppercase
//! `SERVICE` parameter value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use super::{
    LayerDefinitionService, MapCompositionService, MapService, StyleManagerService,
};

/// Registry of available services.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<dyn MapService>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the full service set.
    pub fn with_default_services(composition: MapCompositionService) -> Self {
        let registry = Self::new();
        registry.register(Arc::new(composition));
        registry.register(Arc::new(StyleManagerService));
        registry.register(Arc::new(LayerDefinitionService));
        registry
    }

    /// Register a service under its own name.
    ///
    /// Returns false (and logs) when a service of that name was already
    /// registered; the existing registration wins.
    pub fn register(&self, service: Arc<dyn MapService>) -> bool {
        let name = service.name().to_uppercase();
        let mut services = self.services.write();
        if services.contains_key(&name) {
            error!(service = %name, "service already registered");
            return false;
        }
        info!(service = %name, version = service.version(), "loading service");
        services.insert(name, service);
        true
    }

    /// Look up a service by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn MapService>> {
        self.services.read().get(&name.to_uppercase()).cloned()
    }

    /// Registered service names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }
}
