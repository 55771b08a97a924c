//! HTTP request/response fixtures for biometric service tests.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub user_id: String,
    pub vector: Vec<f64>,
}

/// Body shared by `/enroll` and `/verify`.
pub fn template_request(user_id: &str, vector: &[f64]) -> TemplateRequest {
    TemplateRequest {
        user_id: user_id.to_string(),
        vector: vector.to_vec(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticRequest {
    pub vector: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mul: Option<f64>,
}

pub fn arithmetic_request(vector: &[f64], add: Option<f64>, mul: Option<f64>) -> ArithmeticRequest {
    ArithmeticRequest {
        vector: vector.to_vec(),
        add,
        mul,
    }
}

/// Request missing the `vector` field entirely.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingVectorRequest {
    pub user_id: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub user_id: String,
    pub dimension: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub user_id: String,
    pub is_match: bool,
    pub reason: String,
    pub sums: Option<Vec<f64>>,
    pub products: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitiesResponse {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticResponse {
    pub original: Vec<f64>,
    pub transformed: Vec<f64>,
    pub recovered: Vec<f64>,
    pub add_value: f64,
    pub mul_value: f64,
    pub recovered_matches: bool,
}
