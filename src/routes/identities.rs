use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Serialize;

use super::run_cpu_bound;
use crate::app::AppState;
use crate::error::BiometricError;
use crate::transport;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitiesResponse {
    user_ids: Vec<String>,
}

#[tracing::instrument(skip(state, headers))]
pub async fn list_identities(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, BiometricError> {
    let authenticator = state.authenticator.clone();
    let user_ids = run_cpu_bound(&state, move || authenticator.list_identities()).await?;

    transport::encode_msgpack(&headers, &IdentitiesResponse { user_ids })
}
