use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::CkksContext;
use super::poly::RnsPoly;
use super::CkksError;

/// An encrypted vector of `size` real values.
///
/// Carries the fingerprint of the context that produced it; operations and
/// deserialization under any other context are rejected.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ciphertext {
    pub(crate) c0: RnsPoly,
    pub(crate) c1: RnsPoly,
    pub(crate) scale: f64,
    pub(crate) size: usize,
    pub(crate) fingerprint: [u8; 32],
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ciphertext")
            .field("size", &self.size)
            .field("level", &self.level())
            .field("scale", &self.scale)
            .finish()
    }
}

impl Ciphertext {
    /// Number of meaningful slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Remaining primes in the modulus chain.
    pub fn level(&self) -> usize {
        self.c0.levels()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CkksError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8], context: &CkksContext) -> Result<Self, CkksError> {
        let ciphertext: Ciphertext = bincode::deserialize(bytes)?;
        context.validate_ciphertext(&ciphertext)?;
        Ok(ciphertext)
    }
}
