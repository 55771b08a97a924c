//! Biometric Authentication Service Library
//!
//! Enrollment and verification of CKKS-encrypted biometric templates, the
//! encryption engine they run on, and the HTTP service around them.
//!
//! This library module exposes the workflows and engine for integration tests.

pub mod app;
pub mod ckks;
pub mod crypto;
pub mod error;
pub mod routes;
pub mod settings;
pub mod storage;
pub mod telemetry;
pub mod test_support;
pub mod transport;
pub mod workflow;
