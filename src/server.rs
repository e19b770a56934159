//! HTTP front door: management API, documentation files, and mock dispatch.
//!
//! Dispatch precedence is fixed: the exact management path first, then the
//! documentation prefix, then the endpoint registry. A mock definition whose
//! path collides with a reserved prefix is therefore permanently shadowed by
//! the control plane; registration is still allowed, but logged.

use crate::config::ServerConfig;
use crate::registry::{EndpointDefinition, EndpointRegistry, RegistryError};
use crate::synth::{ResponseSynthesizer, SynthesizedResponse};
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Exact path of the endpoint management API.
pub const MANAGEMENT_PATH: &str = "/api/paths";

/// Path prefix reserved for the documentation file server.
pub const DOCS_PREFIX: &str = "/docs";

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: EndpointRegistry,
    pub synthesizer: Arc<ResponseSynthesizer>,
}

/// Build the front-door router.
///
/// `docs_dir` enables the documentation route when present; without it the
/// docs prefix falls through to mock dispatch like any other path.
pub fn create_router(state: AppState, docs_dir: Option<&Path>) -> Router {
    let mut router = Router::new().route(
        MANAGEMENT_PATH,
        get(list_paths)
            .post(create_path)
            .put(update_path)
            .delete(delete_path),
    );
    if let Some(dir) = docs_dir {
        router = router.nest_service(DOCS_PREFIX, ServeDir::new(dir));
    }
    router
        .fallback(dispatch_mock)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until SIGINT or SIGTERM.
pub async fn run(config: ServerConfig, registry: EndpointRegistry) -> anyhow::Result<()> {
    let state = AppState {
        registry,
        synthesizer: Arc::new(ResponseSynthesizer::new()),
    };
    let router = create_router(state, config.docs_dir.as_deref());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn list_paths(State(state): State<AppState>) -> Json<Vec<EndpointDefinition>> {
    Json(state.registry.list().await)
}

async fn create_path(State(state): State<AppState>, body: Bytes) -> Response {
    let def: EndpointDefinition = match serde_json::from_slice(&body) {
        Ok(def) => def,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    warn_if_shadowed(&def.path);
    match state.registry.add(def).await {
        Ok(stored) => {
            info!(id = stored.id, path = %stored.path, "Registered endpoint");
            Json(stored).into_response()
        }
        Err(err) => registry_error_response(err),
    }
}

async fn update_path(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let id = match parse_id(&params) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let def: EndpointDefinition = match serde_json::from_slice(&body) {
        Ok(def) => def,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    warn_if_shadowed(&def.path);
    match state.registry.update(id, def).await {
        Ok(stored) => {
            info!(id = stored.id, path = %stored.path, "Updated endpoint");
            Json(stored).into_response()
        }
        Err(err) => registry_error_response(err),
    }
}

async fn delete_path(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = match parse_id(&params) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.registry.delete(id).await {
        Ok(()) => {
            info!(id, "Deleted endpoint");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => registry_error_response(err),
    }
}

/// Answer a non-reserved path from the registry.
async fn dispatch_mock(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(def) = state.registry.get_by_path(uri.path()).await else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    let synthesized = state.synthesizer.synthesize(&def);
    debug!(
        path = %def.path,
        delay_ms = synthesized.delay.as_millis() as u64,
        status = synthesized.status,
        "Serving mock response"
    );
    if !synthesized.delay.is_zero() {
        tokio::time::sleep(synthesized.delay).await;
    }
    into_http_response(synthesized)
}

fn into_http_response(synthesized: SynthesizedResponse) -> Response {
    let SynthesizedResponse {
        status,
        headers,
        body,
        ..
    } = synthesized;

    let status = match StatusCode::from_u16(status) {
        Ok(status) => status,
        Err(_) => {
            warn!(status, "Stored definition carries an unusable status code");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = if body.is_empty() {
        Body::empty()
    } else {
        Body::from(body)
    };
    let mut response = Response::new(body);
    *response.status_mut() = status;

    // Definition headers win over anything already set for the same name.
    for (name, values) in &headers {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                warn!(header = %name, "Skipping response header with invalid name");
                continue;
            }
        };
        response.headers_mut().remove(&name);
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    response.headers_mut().append(name.clone(), value);
                }
                Err(_) => {
                    warn!(header = %name, "Skipping response header with invalid value");
                }
            }
        }
    }
    response
}

fn parse_id(params: &HashMap<String, String>) -> Result<u64, Response> {
    let Some(raw) = params.get("id") else {
        return Err((StatusCode::BAD_REQUEST, "missing id in url's query").into_response());
    };
    raw.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "id is not integer").into_response())
}

fn registry_error_response(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::Validation(_) | RegistryError::DuplicatePath(_) => StatusCode::BAD_REQUEST,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, err.to_string()).into_response()
}

fn warn_if_shadowed(path: &str) {
    if path == MANAGEMENT_PATH || path == DOCS_PREFIX || path.starts_with("/docs/") {
        warn!(
            path,
            "Path is reserved by the control plane; the mock definition will never be reachable"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AppState {
            registry: EndpointRegistry::new(),
            synthesizer: Arc::new(ResponseSynthesizer::with_seed(0)),
        };
        create_router(state, None)
    }

    #[tokio::test]
    async fn unmatched_path_is_plain_404() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/nothing-here")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"not found");
    }

    #[tokio::test]
    async fn management_path_rejects_unknown_methods() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(MANAGEMENT_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn docs_route_serves_configured_directory() {
        let docs = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("index.html"), "<h1>docs</h1>").unwrap();

        let state = AppState {
            registry: EndpointRegistry::new(),
            synthesizer: Arc::new(ResponseSynthesizer::with_seed(0)),
        };
        let router = create_router(state, Some(docs.path()));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/docs/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"<h1>docs</h1>");
    }

    #[tokio::test]
    async fn invalid_stored_header_is_skipped_not_fatal() {
        let mut headers = HashMap::new();
        headers.insert("X-Ok".to_string(), vec!["fine".to_string()]);
        headers.insert("bad header name".to_string(), vec!["x".to_string()]);

        let response = into_http_response(SynthesizedResponse {
            delay: std::time::Duration::ZERO,
            status: 200,
            headers,
            body: String::new(),
        });

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Ok").unwrap(), "fine");
        assert_eq!(response.headers().len(), 1);
    }
}
