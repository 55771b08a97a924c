//! Template enrollment endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::run_cpu_bound;
use crate::app::AppState;
use crate::error::BiometricError;
use crate::transport;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    user_id: String,
    vector: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    user_id: String,
    dimension: usize,
}

#[tracing::instrument(skip(state, headers, body), fields(request_bytes = body.len()))]
pub async fn enroll(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BiometricError> {
    let EnrollRequest { user_id, vector } = transport::decode_msgpack(&headers, body)?;
    let user_id = user_id.trim().to_string();
    let dimension = vector.len();

    let authenticator = state.authenticator.clone();
    let enrolled_id = user_id.clone();
    run_cpu_bound(&state, move || authenticator.enroll(&enrolled_id, &vector)).await?;

    transport::encode_msgpack(&headers, &EnrollResponse { user_id, dimension })
}
