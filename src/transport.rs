//! msgpack request/response bodies with optional gzip in either direction.

use std::io::{Read, Write};

use axum::body::Bytes;
use axum::http::header::{HeaderName, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BiometricError, BiometricResult};

/// Ceiling on an inflated request body. Compressed bodies are already bounded
/// by the router's body limit; this bounds what they expand to.
const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

fn header_contains(headers: &HeaderMap, key: HeaderName, needle: &str) -> bool {
    headers
        .get(key)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains(needle))
        .unwrap_or(false)
}

fn inflate(body: &[u8]) -> BiometricResult<Vec<u8>> {
    let mut inflated = Vec::new();
    GzDecoder::new(body)
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut inflated)?;
    if inflated.len() as u64 > MAX_INFLATED_BYTES {
        return Err(BiometricError::InvalidInput(format!(
            "request body exceeds {MAX_INFLATED_BYTES} bytes once decompressed"
        )));
    }
    Ok(inflated)
}

fn deflate(payload: &[u8]) -> BiometricResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

pub fn decode_msgpack<T: DeserializeOwned>(headers: &HeaderMap, body: Bytes) -> BiometricResult<T> {
    let parsed = if header_contains(headers, CONTENT_ENCODING, "gzip") {
        rmp_serde::from_slice(&inflate(&body)?)?
    } else {
        rmp_serde::from_slice(&body)?
    };
    Ok(parsed)
}

pub fn encode_msgpack<T: Serialize>(headers: &HeaderMap, payload: &T) -> BiometricResult<Response> {
    let encoded = rmp_serde::to_vec_named(payload)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/msgpack"));

    let body = if header_contains(headers, ACCEPT_ENCODING, "gzip") {
        response_headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        deflate(&encoded)?
    } else {
        encoded
    };

    Ok((StatusCode::OK, response_headers, body).into_response())
}
