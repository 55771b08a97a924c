//! Liveness and build metadata.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::{AppState, SERVICE_NAME};

/// Liveness plus what a caller needs to check it talks to the right
/// deployment: templates enrolled elsewhere only verify under the same
/// context fingerprint and dimension.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    template_dimension: usize,
    context_fingerprint: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let authenticator = state.authenticator();
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        template_dimension: authenticator.policy().dimension,
        context_fingerprint: authenticator.context().fingerprint_hex(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfoResponse {
    service: &'static str,
    version: &'static str,
    git_sha: &'static str,
    build_time: &'static str,
}

// GIT_SHA and BUILD_TIME come from build.rs.
const BUILD_INFO: BuildInfoResponse = BuildInfoResponse {
    service: SERVICE_NAME,
    version: env!("CARGO_PKG_VERSION"),
    git_sha: env!("GIT_SHA"),
    build_time: env!("BUILD_TIME"),
};

pub async fn build_info() -> Json<BuildInfoResponse> {
    Json(BUILD_INFO)
}
