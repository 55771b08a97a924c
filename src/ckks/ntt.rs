//! Negacyclic number theoretic transform over `Z_q[X]/(X^n + 1)`.
//!
//! The negacyclic transform is computed as a cyclic one on a twisted input:
//! coefficient `i` is multiplied by `psi^i` (psi a primitive `2n`-th root),
//! an iterative Cooley-Tukey NTT with `omega = psi^2` runs in place, and the
//! inverse undoes the twist together with the `n^-1` scaling.

use super::arith::{add_mod, inv_mod, mul_mod, pow_mod, primitive_root_2n, sub_mod};

#[derive(Debug, Clone)]
pub(crate) struct NttTable {
    modulus: u64,
    n: usize,
    psi_powers: Vec<u64>,
    /// `psi^-i * n^-1`, folded so the inverse needs a single pass.
    psi_inv_powers: Vec<u64>,
    roots: Vec<u64>,
    inv_roots: Vec<u64>,
}

impl NttTable {
    pub fn new(n: usize, modulus: u64) -> Self {
        let psi = primitive_root_2n(n, modulus);
        let psi_inv = inv_mod(psi, modulus);
        let n_inv = inv_mod(n as u64 % modulus, modulus);
        let omega = mul_mod(psi, psi, modulus);
        let omega_inv = inv_mod(omega, modulus);

        let mut psi_powers = Vec::with_capacity(n);
        let mut psi_inv_powers = Vec::with_capacity(n);
        let mut forward = 1u64;
        let mut backward = n_inv;
        for _ in 0..n {
            psi_powers.push(forward);
            psi_inv_powers.push(backward);
            forward = mul_mod(forward, psi, modulus);
            backward = mul_mod(backward, psi_inv, modulus);
        }

        let half = n / 2;
        let roots = (0..half)
            .map(|j| pow_mod(omega, j as u64, modulus))
            .collect();
        let inv_roots = (0..half)
            .map(|j| pow_mod(omega_inv, j as u64, modulus))
            .collect();

        Self {
            modulus,
            n,
            psi_powers,
            psi_inv_powers,
            roots,
            inv_roots,
        }
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn forward(&self, values: &mut [u64]) {
        let q = self.modulus;
        for (value, &twist) in values.iter_mut().zip(&self.psi_powers) {
            *value = mul_mod(*value, twist, q);
        }
        self.cyclic(values, &self.roots);
    }

    pub fn inverse(&self, values: &mut [u64]) {
        let q = self.modulus;
        self.cyclic(values, &self.inv_roots);
        for (value, &untwist) in values.iter_mut().zip(&self.psi_inv_powers) {
            *value = mul_mod(*value, untwist, q);
        }
    }

    /// Product of two polynomials in coefficient form, modulo `X^n + 1`.
    pub fn multiply(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut lhs = a.to_vec();
        let mut rhs = b.to_vec();
        self.forward(&mut lhs);
        self.forward(&mut rhs);
        pointwise_mul_assign(&mut lhs, &rhs, self.modulus);
        self.inverse(&mut lhs);
        lhs
    }

    fn cyclic(&self, values: &mut [u64], roots: &[u64]) {
        let n = self.n;
        let q = self.modulus;
        debug_assert_eq!(values.len(), n);

        bit_reverse_permute(values);

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for j in 0..half {
                    let w = roots[j * stride];
                    let u = values[start + j];
                    let t = mul_mod(values[start + j + half], w, q);
                    values[start + j] = add_mod(u, t, q);
                    values[start + j + half] = sub_mod(u, t, q);
                }
            }
            len <<= 1;
        }
    }
}

pub(crate) fn pointwise_mul_assign(acc: &mut [u64], other: &[u64], q: u64) {
    for (a, &b) in acc.iter_mut().zip(other) {
        *a = mul_mod(*a, b, q);
    }
}

/// `acc += a * b`, all three in the evaluation domain.
pub(crate) fn pointwise_mul_add_assign(acc: &mut [u64], a: &[u64], b: &[u64], q: u64) {
    for ((slot, &x), &y) in acc.iter_mut().zip(a).zip(b) {
        *slot = add_mod(*slot, mul_mod(x, y, q), q);
    }
}

fn bit_reverse_permute(values: &mut [u64]) {
    let n = values.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            values.swap(i, j);
        }
    }
}
