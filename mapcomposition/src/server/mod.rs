//! HTTP front-end: query parameters in, service dispatch out.
//!
//! A single GET route accepts OGC-style key=value query parameters,
//! normalizes the keys, and dispatches on the `SERVICE` parameter through
//! the [`ServiceRegistry`]. Service execution is synchronous filesystem
//! work, so it runs on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use tokio_util::sync::CancellationToken;

use crate::service::{Method, ServiceRegistry, ServiceRequest, ServiceResponse};

/// Server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Errors starting or running the front-end.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind and serve until the token is cancelled.
pub async fn run(
    registry: Arc<ServiceRegistry>,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
    serve(listener, registry, shutdown).await
}

/// Serve on an already-bound listener until the token is cancelled.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ServiceRegistry>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, services = ?registry.names(), "front-end listening");
    }
    let app = router(registry);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("front-end stopped");
    Ok(())
}

/// The front-end router. Exposed for tests.
pub fn router(registry: Arc<ServiceRegistry>) -> Router {
    Router::new()
        .route("/", get(dispatch).post(dispatch))
        .with_state(registry)
}

async fn dispatch(
    State(registry): State<Arc<ServiceRegistry>>,
    method: axum::http::Method,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(method) = map_method(&method) else {
        return to_response(ServiceResponse::method_not_allowed());
    };

    let request = ServiceRequest::new(method, params);
    let Some(service_name) = request.get("SERVICE").map(str::to_string) else {
        return to_response(ServiceResponse::bad_request("SERVICE parameter is missing"));
    };

    let Some(service) = registry.get(&service_name) else {
        warn!(service = %service_name, "unknown service requested");
        return to_response(ServiceResponse::bad_request(format!(
            "unknown service: {}",
            service_name
        )));
    };

    if !service.allow_method(method) {
        return to_response(ServiceResponse::method_not_allowed());
    }

    // Composition does blocking filesystem and image work
    let result = tokio::task::spawn_blocking(move || service.execute(&request)).await;
    match result {
        Ok(response) => to_response(response),
        Err(e) => {
            warn!(service = %service_name, error = %e, "service task failed");
            to_response(ServiceResponse::server_error("service task failed"))
        }
    }
}

fn map_method(method: &axum::http::Method) -> Option<Method> {
    match *method {
        axum::http::Method::GET => Some(Method::Get),
        axum::http::Method::POST => Some(Method::Post),
        axum::http::Method::HEAD => Some(Method::Head),
        axum::http::Method::PUT => Some(Method::Put),
        axum::http::Method::DELETE => Some(Method::Delete),
        axum::http::Method::OPTIONS => Some(Method::Options),
        _ => None,
    }
}

fn to_response(response: ServiceResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}
