//! Template verification endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::run_cpu_bound;
use crate::app::AppState;
use crate::crypto::MatchReason;
use crate::error::BiometricError;
use crate::transport;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    user_id: String,
    vector: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    user_id: String,
    is_match: bool,
    reason: MatchReason,
    /// Decrypted diagnostics, only when the deployment opts in.
    #[serde(skip_serializing_if = "Option::is_none")]
    sums: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<f64>>,
}

#[tracing::instrument(skip(state, headers, body), fields(request_bytes = body.len()))]
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BiometricError> {
    let VerifyRequest { user_id, vector } = transport::decode_msgpack(&headers, body)?;
    let user_id = user_id.trim().to_string();

    let authenticator = state.authenticator.clone();
    let probe_id = user_id.clone();
    let decision = run_cpu_bound(&state, move || authenticator.verify(&probe_id, &vector)).await?;

    let (sums, products) = if state.expose_diagnostics {
        (Some(decision.sums), Some(decision.products))
    } else {
        (None, None)
    };

    transport::encode_msgpack(
        &headers,
        &VerifyResponse {
            user_id,
            is_match: decision.is_match,
            reason: decision.reason,
            sums,
            products,
        },
    )
}
