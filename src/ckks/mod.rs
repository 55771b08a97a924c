//! RNS-CKKS approximate homomorphic encryption.
//!
//! A compact implementation of the CKKS scheme over a residue number system:
//! vectors of real numbers are packed into polynomial slots, encrypted under
//! RLWE, and combined with addition, subtraction, multiplication
//! (relinearized and rescaled), plaintext-scalar operations and slot
//! rotations. Everything callers need goes through [`CkksContext`] and
//! [`Ciphertext`].

mod arith;
mod ciphertext;
mod context;
mod encoding;
mod keys;
mod ntt;
mod params;
mod poly;

use thiserror::Error;

pub use ciphertext::Ciphertext;
pub use context::CkksContext;
pub use params::CkksParams;

#[derive(Error, Debug)]
pub enum CkksError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Vector size mismatch: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("Scale mismatch: {left} vs {right}")]
    ScaleMismatch { left: f64, right: f64 },

    #[error("Multiplicative depth exhausted")]
    DepthExhausted,

    #[error("Secret key is not available in this context")]
    MissingSecretKey,

    #[error("No rotation key for step {0}")]
    MissingRotationKey(i64),

    #[error("Too many values: {count} exceeds {slots} slots")]
    TooManyValues { count: usize, slots: usize },

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Ciphertext was produced under a different context")]
    ContextMismatch,

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl CkksError {
    /// Errors a caller can fix by changing its input rather than the deployment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CkksError::SizeMismatch { .. }
                | CkksError::TooManyValues { .. }
                | CkksError::ValueOutOfRange(_)
        )
    }
}
