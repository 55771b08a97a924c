//! Canonical embedding encoder.
//!
//! A real vector of up to `n/2` values is mapped to an integer polynomial
//! whose evaluations at the primitive `2n`-th roots `zeta^(5^t)` equal the
//! values times the scale. Slots follow the orbit of 5 in `(Z/2nZ)*`, which
//! makes the automorphism `X -> X^5` a rotation of the slot vector by one.
//!
//! Both directions go through a length-`n` complex FFT: evaluating at
//! `zeta^(2k+1)` is a DFT of the coefficients twisted by `zeta^j`.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use super::CkksError;

pub(crate) struct Encoder {
    n: usize,
    slot_index: Vec<usize>,
    conj_index: Vec<usize>,
    twist: Vec<Complex64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl Encoder {
    pub fn new(n: usize) -> Self {
        let two_n = 2 * n;
        let slots = n / 2;

        let mut slot_index = Vec::with_capacity(slots);
        let mut conj_index = Vec::with_capacity(slots);
        let mut power = 1usize;
        for _ in 0..slots {
            slot_index.push((power - 1) / 2);
            conj_index.push((two_n - power - 1) / 2);
            power = (power * 5) % two_n;
        }

        let twist = (0..n)
            .map(|j| Complex64::from_polar(1.0, PI * j as f64 / n as f64))
            .collect();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        Self {
            n,
            slot_index,
            conj_index,
            twist,
            forward,
            inverse,
        }
    }

    pub fn slots(&self) -> usize {
        self.n / 2
    }

    /// Encode `values` (zero-padded to all slots) at the given scale.
    pub fn encode(&self, values: &[f64], scale: f64) -> Result<Vec<i64>, CkksError> {
        if values.len() > self.slots() {
            return Err(CkksError::TooManyValues {
                count: values.len(),
                slots: self.slots(),
            });
        }

        let mut buffer = vec![Complex64::new(0.0, 0.0); self.n];
        for (t, &value) in values.iter().enumerate() {
            buffer[self.slot_index[t]] = Complex64::new(value, 0.0);
            buffer[self.conj_index[t]] = Complex64::new(value, 0.0);
        }
        self.forward.process(&mut buffer);

        let norm = scale / self.n as f64;
        let coeffs = buffer
            .iter()
            .zip(&self.twist)
            .map(|(&value, twist)| ((value * twist.conj()).re * norm).round() as i64)
            .collect();
        Ok(coeffs)
    }

    /// Decode the first `count` slots of a centered coefficient vector.
    pub fn decode(&self, coeffs: &[i64], scale: f64, count: usize) -> Vec<f64> {
        let mut buffer: Vec<Complex64> = coeffs
            .iter()
            .zip(&self.twist)
            .map(|(&c, &twist)| twist * c as f64)
            .collect();
        self.inverse.process(&mut buffer);

        self.slot_index[..count.min(self.slots())]
            .iter()
            .map(|&index| buffer[index].re / scale)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_recovers_values() {
        let encoder = Encoder::new(256);
        let values = [0.0, 0.1, -0.2, 3.5, 1e3];
        let scale = 2f64.powi(40);

        let coeffs = encoder.encode(&values, scale).unwrap();
        let decoded = encoder.decode(&coeffs, scale, values.len());
        for (expected, actual) in values.iter().zip(&decoded) {
            assert!((expected - actual).abs() < 1e-6, "{expected} vs {actual}");
        }
    }

    #[test]
    fn test_unused_slots_decode_to_zero() {
        let encoder = Encoder::new(64);
        let scale = 2f64.powi(30);
        let coeffs = encoder.encode(&[1.0, 2.0], scale).unwrap();
        let decoded = encoder.decode(&coeffs, scale, encoder.slots());
        assert!(decoded[2..].iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_rejects_too_many_values() {
        let encoder = Encoder::new(16);
        let err = encoder.encode(&[0.0; 9], 1024.0).unwrap_err();
        assert!(matches!(err, CkksError::TooManyValues { count: 9, slots: 8 }));
    }
}
