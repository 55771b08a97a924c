//! Router construction for the biometric authentication HTTP API.

use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use serde_json::json;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{routes, settings::Settings, workflow::Authenticator};

/// Name reported by `/health`, `/build-info` and exported spans.
pub const SERVICE_NAME: &str = "biometric-auth";

/// Shared handler state. Cloned per request; everything inside is `Arc`ed.
#[derive(Clone)]
pub struct AppState {
    pub(crate) authenticator: Authenticator,
    pub(crate) cpu_permits: Arc<Semaphore>,
    pub(crate) expose_diagnostics: bool,
}

impl AppState {
    pub fn new(authenticator: Authenticator, settings: &Settings) -> Self {
        Self {
            authenticator,
            cpu_permits: Arc::new(Semaphore::new(settings.cpu_concurrency_limit())),
            expose_diagnostics: settings.expose_diagnostics(),
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}

pub fn build_router(settings: &Settings, authenticator: Authenticator) -> Router {
    let state = AppState::new(authenticator, settings);

    Router::new()
        .route("/health", get(routes::health))
        .route("/build-info", get(routes::build_info))
        .route("/enroll", post(routes::enroll))
        .route("/verify", post(routes::verify))
        .route("/identities", get(routes::list_identities))
        .route("/demo/arithmetic", post(routes::arithmetic_demo))
        .with_state(state)
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes()))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .concurrency_limit(settings.concurrency_limit())
                .timeout(settings.request_timeout()),
        )
        .layer(TraceLayer::new_for_http())
}

async fn handle_middleware_error(error: BoxError) -> Response {
    let (status, code) = if error.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "OVERLOADED")
    };
    tracing::warn!(%status, "Request rejected by middleware: {error}");

    (
        status,
        Json(json!({ "error": error.to_string(), "code": code })),
    )
        .into_response()
}
