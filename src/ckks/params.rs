//! Scheme parameters.

use serde::{Deserialize, Serialize};

use super::CkksError;

const MIN_POLY_DEGREE: usize = 1024;
const MAX_POLY_DEGREE: usize = 16384;
const MIN_PRIME_BITS: u32 = 20;
const MAX_PRIME_BITS: u32 = 60;
const MAX_PRIMES: usize = 8;

/// CKKS parameters.
///
/// `coeff_bit_sizes` lists the prime chain from the bottom: the first prime
/// carries the decrypted message, the middle primes are consumed one per
/// rescale, and the last one is the special prime used only for key
/// switching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CkksParams {
    pub poly_degree: usize,
    pub coeff_bit_sizes: Vec<u32>,
    pub scale_bits: u32,
    /// Slot rotations for which Galois keys are generated.
    pub rotation_steps: Vec<i64>,
}

impl Default for CkksParams {
    fn default() -> Self {
        Self {
            poly_degree: 8192,
            coeff_bit_sizes: vec![60, 40, 40, 60],
            scale_bits: 40,
            rotation_steps: vec![1, 2, 4],
        }
    }
}

impl CkksParams {
    /// Smaller ring for tests; same prime chain and scale.
    pub fn for_tests() -> Self {
        Self {
            poly_degree: 4096,
            ..Self::default()
        }
    }

    pub fn with_rotation_steps(mut self, steps: Vec<i64>) -> Self {
        self.rotation_steps = steps;
        self
    }

    pub fn slots(&self) -> usize {
        self.poly_degree / 2
    }

    pub fn scale(&self) -> f64 {
        2f64.powi(self.scale_bits as i32)
    }

    /// Number of ciphertext-ciphertext multiplications a fresh ciphertext supports.
    pub fn max_depth(&self) -> usize {
        self.coeff_bit_sizes.len().saturating_sub(2)
    }

    pub fn validate(&self) -> Result<(), CkksError> {
        let n = self.poly_degree;
        if !n.is_power_of_two() || !(MIN_POLY_DEGREE..=MAX_POLY_DEGREE).contains(&n) {
            return Err(CkksError::InvalidParameters(format!(
                "poly_degree must be a power of two in [{MIN_POLY_DEGREE}, {MAX_POLY_DEGREE}], got {n}"
            )));
        }

        let primes = self.coeff_bit_sizes.len();
        if !(2..=MAX_PRIMES).contains(&primes) {
            return Err(CkksError::InvalidParameters(format!(
                "coeff_bit_sizes must list between 2 and {MAX_PRIMES} primes, got {primes}"
            )));
        }
        if let Some(bits) = self
            .coeff_bit_sizes
            .iter()
            .find(|bits| !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(bits))
        {
            return Err(CkksError::InvalidParameters(format!(
                "prime sizes must be within [{MIN_PRIME_BITS}, {MAX_PRIME_BITS}] bits, got {bits}"
            )));
        }

        // The decryption prime must leave headroom above the scale.
        let first = self.coeff_bit_sizes[0];
        if self.scale_bits < MIN_PRIME_BITS || self.scale_bits >= first {
            return Err(CkksError::InvalidParameters(format!(
                "scale_bits must be within [{MIN_PRIME_BITS}, {first}), got {}",
                self.scale_bits
            )));
        }

        let slots = self.slots() as i64;
        if let Some(step) = self
            .rotation_steps
            .iter()
            .find(|step| **step == 0 || step.abs() >= slots)
        {
            return Err(CkksError::InvalidParameters(format!(
                "rotation step {step} must be non-zero and smaller than {slots} in magnitude"
            )));
        }

        Ok(())
    }
}
