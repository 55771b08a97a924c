//! HTTP test utilities for biometric service integration tests.
//!
//! Provides a test app builder that mirrors the production router setup
//! with a memory store over the shared test context.
#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{de::DeserializeOwned, Serialize};

use biometric_service::{
    app::build_router,
    settings::Settings,
    storage::{MemoryTemplateStore, TemplateStore},
    test_support,
    workflow::Authenticator,
};

pub mod fixtures;

pub const DIMENSION: usize = 5;

/// Builder for creating test routers with configurable policy and limits.
pub struct TestAppBuilder {
    settings: Settings,
    store: Arc<dyn TemplateStore>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::for_tests().with_template_dimension(DIMENSION),
            store: Arc::new(MemoryTemplateStore::new()),
        }
    }

    pub fn with_diagnostics(mut self) -> Self {
        self.settings = self.settings.with_expose_diagnostics(true);
        self
    }

    pub fn with_template_dimension(mut self, dimension: usize) -> Self {
        self.settings = self.settings.with_template_dimension(dimension);
        self
    }

    pub fn with_body_limit_bytes(mut self, bytes: usize) -> Self {
        self.settings = self.settings.with_body_limit_bytes(bytes);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> Router {
        let context =
            test_support::context::shared_test_context().expect("test context generation failed");
        let authenticator = Authenticator::from_settings(context, self.store, &self.settings)
            .expect("failed to build test authenticator");
        build_router(&self.settings, authenticator)
    }
}

/// Test router with an empty memory store.
pub fn test_app() -> Router {
    TestAppBuilder::new().build()
}

pub fn msgpack_body<T: Serialize>(payload: &T) -> Vec<u8> {
    rmp_serde::to_vec_named(payload).expect("msgpack encode failed")
}

pub fn gzip_msgpack_body<T: Serialize>(payload: &T) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&msgpack_body(payload)).unwrap();
    encoder.finish().unwrap()
}

pub fn post_msgpack<T: Serialize>(uri: &str, payload: &T) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/msgpack")
        .body(Body::from(msgpack_body(payload)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn parse_msgpack_body<T: DeserializeOwned>(response: Response) -> T {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    rmp_serde::from_slice(&body).expect("response is not valid msgpack")
}

/// Helper to parse JSON response body.
pub async fn parse_json_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Helper to get response status and body as string (for debugging).
pub async fn response_debug(response: Response) -> (StatusCode, String) {
    use http_body_util::BodyExt;

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&body).to_string();
    (status, text)
}
