//! Enrollment, verification and identity listing over HTTP.

mod http;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use http::fixtures::{
    template_request, EnrollResponse, IdentitiesResponse, VerifyResponse,
};

const ALICE: [f64; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];
const BOB: [f64; 5] = [0.9, 0.8, 0.7, 0.6, 0.5];

// ============================================================================
// Enrollment
// ============================================================================

#[tokio::test]
async fn enroll_returns_user_and_dimension() {
    let app = http::test_app();

    let response = app
        .oneshot(http::post_msgpack("/enroll", &template_request(" alice ", &ALICE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/msgpack");

    let body: EnrollResponse = http::parse_msgpack_body(response).await;
    assert_eq!(body.user_id, "alice");
    assert_eq!(body.dimension, 5);
}

// ============================================================================
// Verification
// ============================================================================

/// Enroll then verify the same vector, then an impostor vector.
#[tokio::test]
async fn enroll_then_verify() {
    let app = http::test_app();

    let response = app
        .clone()
        .oneshot(http::post_msgpack("/enroll", &template_request("alice", &ALICE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(http::post_msgpack("/verify", &template_request("alice", &ALICE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: VerifyResponse = http::parse_msgpack_body(response).await;
    assert_eq!(body.user_id, "alice");
    assert!(body.is_match);
    assert_eq!(body.reason, "matched");
    assert!(body.sums.is_none() && body.products.is_none());

    let response = app
        .oneshot(http::post_msgpack("/verify", &template_request("alice", &BOB)))
        .await
        .unwrap();
    let body: VerifyResponse = http::parse_msgpack_body(response).await;
    assert!(!body.is_match);
    assert_eq!(body.reason, "biometric_mismatch");
}

#[tokio::test]
async fn verify_unknown_identity() {
    let app = http::test_app();

    let response = app
        .oneshot(http::post_msgpack("/verify", &template_request("nobody", &ALICE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: VerifyResponse = http::parse_msgpack_body(response).await;
    assert!(!body.is_match);
    assert_eq!(body.reason, "unknown_identity");
}

/// Diagnostics appear only when the deployment enables them.
#[tokio::test]
async fn diagnostics_exposed_when_enabled() {
    let app = http::TestAppBuilder::new().with_diagnostics().build();

    app.clone()
        .oneshot(http::post_msgpack("/enroll", &template_request("alice", &ALICE)))
        .await
        .unwrap();
    let response = app
        .oneshot(http::post_msgpack("/verify", &template_request("alice", &ALICE)))
        .await
        .unwrap();

    let body: VerifyResponse = http::parse_msgpack_body(response).await;
    let sums = body.sums.expect("sums should be present");
    let products = body.products.expect("products should be present");
    assert_eq!(sums.len(), 5);
    assert!((sums[0] - 0.2).abs() < 1e-3);
    assert!((products[4] - 0.25).abs() < 1e-3);
}

/// gzip request bodies are accepted and gzip responses honoured.
#[tokio::test]
async fn gzip_round_trip() {
    let app = http::test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/enroll")
                .header("content-type", "application/msgpack")
                .header("content-encoding", "gzip")
                .header("accept-encoding", "gzip")
                .body(Body::from(http::gzip_msgpack_body(&template_request(
                    "alice", &ALICE,
                ))))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
}

// ============================================================================
// Identities
// ============================================================================

#[tokio::test]
async fn identities_are_listed_sorted() {
    let app = http::test_app();

    for (user, vector) in [("bob", BOB), ("alice", ALICE), ("bob", ALICE)] {
        let response = app
            .clone()
            .oneshot(http::post_msgpack("/enroll", &template_request(user, &vector)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(http::get("/identities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: IdentitiesResponse = http::parse_msgpack_body(response).await;
    assert_eq!(body.user_ids, vec!["alice", "bob"]);
}
