//! Homomorphic arithmetic demonstration endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use super::run_cpu_bound;
use crate::app::AppState;
use crate::crypto;
use crate::error::BiometricError;
use crate::transport;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticRequest {
    vector: Vec<f64>,
    /// Drawn at random when absent.
    add: Option<f64>,
    mul: Option<f64>,
}

#[tracing::instrument(skip(state, headers, body), fields(request_bytes = body.len()))]
pub async fn arithmetic_demo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BiometricError> {
    let ArithmeticRequest { vector, add, mul } = transport::decode_msgpack(&headers, body)?;
    let (random_add, random_mul) = crypto::random_constants();
    let add = add.unwrap_or(random_add);
    let mul = mul.unwrap_or(random_mul);

    let context = state.authenticator.context().clone();
    let demo = run_cpu_bound(&state, move || {
        crypto::run_reversal(&context, &vector, add, mul)
    })
    .await?;

    transport::encode_msgpack(&headers, &demo)
}
