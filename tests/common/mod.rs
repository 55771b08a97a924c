//! Shared test utilities for biometric service integration tests.
//!
//! # Performance Note
//!
//! Context generation (relinearization and rotation keys) is the slowest
//! step of every test. The reduced-size test context is generated once per
//! test binary and shared through `test_support`.
#![allow(dead_code)]

use std::sync::Arc;

use biometric_service::ckks::CkksContext;
use biometric_service::storage::TemplateStore;
use biometric_service::test_support;
use biometric_service::workflow::Authenticator;

pub const DIMENSION: usize = 5;

pub const ALICE: [f64; DIMENSION] = [0.1, 0.2, 0.3, 0.4, 0.5];
pub const BOB: [f64; DIMENSION] = [0.9, 0.8, 0.7, 0.6, 0.5];

/// Shared reduced-size context.
pub fn test_context() -> Arc<CkksContext> {
    test_support::context::shared_test_context().expect("test context generation failed")
}

/// Authenticator over the shared context with a fresh memory store.
pub fn authenticator() -> Authenticator {
    test_support::authenticator::memory_authenticator(DIMENSION)
        .expect("failed to build test authenticator")
}

pub fn authenticator_with_store(dimension: usize, store: Arc<dyn TemplateStore>) -> Authenticator {
    test_support::authenticator::with_store(dimension, store)
        .expect("failed to build test authenticator")
}

/// `values` with `delta` added to one coordinate.
pub fn perturbed(values: &[f64], index: usize, delta: f64) -> Vec<f64> {
    let mut out = values.to_vec();
    out[index] += delta;
    out
}
