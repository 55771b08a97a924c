//! Reversible homomorphic arithmetic.
//!
//! Encrypts a vector, adds a constant and multiplies by another while
//! encrypted, then decrypts and undoes both steps in plaintext. Illustrative
//! only; it plays no part in authentication decisions.

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::ckks::CkksContext;
use crate::crypto::matching::approximately_equal;
use crate::error::{BiometricError, BiometricResult};

/// Absolute tolerance between the original and recovered coordinates.
pub const REVERSAL_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArithmeticDemo {
    pub original: Vec<f64>,
    pub transformed: Vec<f64>,
    pub recovered: Vec<f64>,
    pub add_value: f64,
    pub mul_value: f64,
    pub recovered_matches: bool,
}

/// Pick the constants the demo uses when the caller supplies none.
pub fn random_constants() -> (f64, f64) {
    let mut rng = rand::rng();
    let add = rng.random_range(1..=20) as f64;
    let mul = rng.random_range(1..=5) as f64;
    (add, mul)
}

pub fn run_reversal(
    context: &CkksContext,
    values: &[f64],
    add: f64,
    mul: f64,
) -> BiometricResult<ArithmeticDemo> {
    if values.is_empty() {
        return Err(BiometricError::InvalidInput(
            "vector must not be empty".to_string(),
        ));
    }
    if !add.is_finite() || !mul.is_finite() {
        return Err(BiometricError::InvalidInput(
            "constants must be finite numbers".to_string(),
        ));
    }
    if mul == 0.0 {
        return Err(BiometricError::InvalidInput(
            "multiplier must be non-zero to be reversible".to_string(),
        ));
    }

    let encrypted = context.encrypt(values)?;
    let shifted = context.add_plain(&encrypted, add)?;
    let scaled = context.mul_plain(&shifted, mul)?;
    let transformed = context.decrypt(&scaled)?;

    let recovered: Vec<f64> = transformed.iter().map(|x| x / mul - add).collect();
    let recovered_matches = approximately_equal(values, &recovered, REVERSAL_TOLERANCE);
    info!(
        size = values.len(),
        add,
        mul,
        recovered_matches,
        "Ran homomorphic arithmetic reversal"
    );

    Ok(ArithmeticDemo {
        original: values.to_vec(),
        transformed,
        recovered,
        add_value: add,
        mul_value: mul,
        recovered_matches,
    })
}
