//! Host-server service interface and the services this crate ships.
//!
//! [`MapService`] mirrors the contract a geospatial server imposes on its
//! extensions: a name the dispatcher keys on, a version, an HTTP method
//! gate, and a request executor. The crate registers three services:
//!
//! - `MAPCOMPOSITION` ([`MapCompositionService`]), the real one;
//! - `STYLEMANAGER` and `LAYERDEFINITION` ([`stubs`]), registered
//!   placeholders answering `501`.

mod composition;
mod error;
mod params;
mod registry;
mod stubs;

use std::collections::HashMap;

pub use composition::{MapCompositionService, DEFAULT_WFS_PRECISION};
pub use error::ServiceError;
pub use params::{parse_flag, ComposeParams};
pub use registry::ServiceRegistry;
pub use stubs::{LayerDefinitionService, StyleManagerService};

/// HTTP method of an incoming service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Options,
}

/// A parameter map plus the method it arrived with.
///
/// Parameter keys are normalized to uppercase at construction; OGC-style
/// front-ends treat `service=` and `SERVICE=` identically.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    method: Method,
    params: HashMap<String, String>,
}

impl ServiceRequest {
    pub fn new(method: Method, params: HashMap<String, String>) -> Self {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        Self { method, params }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Parameter by (case-insensitive) name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(&key.to_uppercase()).map(String::as_str)
    }
}

/// Plain-text service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl ServiceResponse {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(200, body)
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::text(400, body)
    }

    pub fn method_not_allowed() -> Self {
        Self::text(405, "method not allowed")
    }

    pub fn server_error(body: impl Into<String>) -> Self {
        Self::text(500, body)
    }

    pub fn not_implemented(body: impl Into<String>) -> Self {
        Self::text(501, body)
    }
}

/// Contract between the dispatcher and a service implementation.
pub trait MapService: Send + Sync {
    /// Dispatch key, uppercase by convention.
    fn name(&self) -> &'static str;

    /// Service version string.
    fn version(&self) -> &'static str;

    /// Whether the service accepts this HTTP method.
    fn allow_method(&self, method: Method) -> bool {
        method == Method::Get
    }

    /// Handle one request. Must not panic; failures become responses.
    fn execute(&self, request: &ServiceRequest) -> ServiceResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes_keys() {
        let mut params = HashMap::new();
        params.insert("service".to_string(), "MAPCOMPOSITION".to_string());
        let request = ServiceRequest::new(Method::Get, params);

        assert_eq!(request.get("SERVICE"), Some("MAPCOMPOSITION"));
        assert_eq!(request.get("Service"), Some("MAPCOMPOSITION"));
        assert_eq!(request.get("missing"), None);
    }

    #[test]
    fn test_response_helpers() {
        assert_eq!(ServiceResponse::ok("OK").status, 200);
        assert_eq!(ServiceResponse::bad_request("x").status, 400);
        assert_eq!(ServiceResponse::method_not_allowed().status, 405);
        assert_eq!(ServiceResponse::server_error("x").status, 500);
        assert_eq!(ServiceResponse::not_implemented("x").status, 501);
        assert!(ServiceResponse::ok("OK")
            .content_type
            .starts_with("text/plain"));
    }
}
