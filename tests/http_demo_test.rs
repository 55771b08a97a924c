//! Arithmetic demonstration endpoint tests.

mod http;

use axum::http::StatusCode;
use tower::ServiceExt;

use http::fixtures::{arithmetic_request, ArithmeticResponse};

#[tokio::test]
async fn arithmetic_with_explicit_constants() {
    let app = http::test_app();

    let response = app
        .oneshot(http::post_msgpack(
            "/demo/arithmetic",
            &arithmetic_request(&[0.2, 0.4, 0.6], Some(10.0), Some(2.0)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ArithmeticResponse = http::parse_msgpack_body(response).await;
    assert!(body.recovered_matches);
    assert_eq!(body.original, vec![0.2, 0.4, 0.6]);
    assert_eq!(body.add_value, 10.0);
    assert_eq!(body.mul_value, 2.0);
    assert!((body.transformed[0] - 20.4).abs() < 0.01);
    assert!((body.recovered[2] - 0.6).abs() < 0.01);
}

/// Missing constants are drawn from [1, 20] and [1, 5].
#[tokio::test]
async fn arithmetic_with_random_constants() {
    let app = http::test_app();

    let response = app
        .oneshot(http::post_msgpack(
            "/demo/arithmetic",
            &arithmetic_request(&[1.0, 2.0], None, None),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: ArithmeticResponse = http::parse_msgpack_body(response).await;
    assert!(body.recovered_matches);
    assert!((1.0..=20.0).contains(&body.add_value));
    assert!((1.0..=5.0).contains(&body.mul_value));
}

#[tokio::test]
async fn arithmetic_rejects_zero_multiplier() {
    let app = http::test_app();

    let response = app
        .oneshot(http::post_msgpack(
            "/demo/arithmetic",
            &arithmetic_request(&[1.0], Some(1.0), Some(0.0)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = http::parse_json_body(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}
