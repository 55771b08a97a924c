//! Polynomials in double-CRT (RNS) representation.
//!
//! Limb `i` holds the coefficients reduced modulo the `i`-th prime of the
//! basis the polynomial lives in. Polynomials are always kept in coefficient
//! form; the evaluation domain is only entered inside multiplications.

use serde::{Deserialize, Serialize};

use super::arith::{add_mod, center, inv_mod, mul_mod, neg_mod, reduce_i64, sub_mod};
use super::ntt::NttTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RnsPoly {
    limbs: Vec<Vec<u64>>,
}

impl RnsPoly {
    /// Reduce small signed coefficients into every modulus of `tables`.
    pub fn from_signed(coeffs: &[i64], tables: &[&NttTable]) -> Self {
        let limbs = tables
            .iter()
            .map(|table| {
                let q = table.modulus();
                coeffs.iter().map(|&c| reduce_i64(c, q)).collect()
            })
            .collect();
        Self { limbs }
    }

    pub fn from_limbs(limbs: Vec<Vec<u64>>) -> Self {
        Self { limbs }
    }

    pub fn levels(&self) -> usize {
        self.limbs.len()
    }

    pub fn degree(&self) -> usize {
        self.limbs.first().map(Vec::len).unwrap_or(0)
    }

    pub fn limb(&self, index: usize) -> &[u64] {
        &self.limbs[index]
    }

    pub fn limb_mut(&mut self, index: usize) -> &mut [u64] {
        &mut self.limbs[index]
    }

    /// Every limb has `degree` coefficients, each reduced by its modulus.
    pub fn is_reduced(&self, degree: usize, tables: &[&NttTable]) -> bool {
        self.limbs.len() <= tables.len()
            && self.limbs.iter().zip(tables).all(|(limb, table)| {
                let q = table.modulus();
                limb.len() == degree && limb.iter().all(|&c| c < q)
            })
    }

    pub fn add(&self, other: &Self, tables: &[&NttTable]) -> Self {
        self.zip_with(other, tables, add_mod)
    }

    pub fn sub(&self, other: &Self, tables: &[&NttTable]) -> Self {
        self.zip_with(other, tables, sub_mod)
    }

    pub fn neg(&self, tables: &[&NttTable]) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(tables)
            .map(|(limb, table)| {
                let q = table.modulus();
                limb.iter().map(|&c| neg_mod(c, q)).collect()
            })
            .collect();
        Self { limbs }
    }

    pub fn mul(&self, other: &Self, tables: &[&NttTable]) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(&other.limbs)
            .zip(tables)
            .map(|((a, b), table)| table.multiply(a, b))
            .collect();
        Self { limbs }
    }

    /// Multiply every coefficient by a signed integer constant.
    pub fn mul_scalar(&self, scalar: i128, tables: &[&NttTable]) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(tables)
            .map(|(limb, table)| {
                let q = table.modulus();
                let factor = scalar.rem_euclid(q as i128) as u64;
                limb.iter().map(|&c| mul_mod(c, factor, q)).collect()
            })
            .collect();
        Self { limbs }
    }

    /// Add a signed constant to the constant coefficient.
    pub fn add_constant(&self, constant: i128, tables: &[&NttTable]) -> Self {
        let mut out = self.clone();
        for (limb, table) in out.limbs.iter_mut().zip(tables) {
            let q = table.modulus();
            let term = constant.rem_euclid(q as i128) as u64;
            limb[0] = add_mod(limb[0], term, q);
        }
        out
    }

    /// Keep only the first `levels` limbs.
    pub fn truncated(&self, levels: usize) -> Self {
        Self {
            limbs: self.limbs[..levels.min(self.limbs.len())].to_vec(),
        }
    }

    /// Apply `X -> X^galois` (with `galois` odd), in coefficient form.
    pub fn automorphism(&self, galois: usize, tables: &[&NttTable]) -> Self {
        let n = self.degree();
        let two_n = 2 * n;
        let limbs = self
            .limbs
            .iter()
            .zip(tables)
            .map(|(limb, table)| {
                let q = table.modulus();
                let mut out = vec![0u64; n];
                for (i, &c) in limb.iter().enumerate() {
                    let target = (i * galois) % two_n;
                    if target < n {
                        out[target] = c;
                    } else {
                        out[target - n] = neg_mod(c, q);
                    }
                }
                out
            })
            .collect();
        Self { limbs }
    }

    /// Divide by the last prime of the basis and drop that limb.
    ///
    /// Computes `round(x / q_last)` exactly in RNS: the last limb is lifted
    /// to its centered representative, subtracted from every other limb and
    /// the difference multiplied by `q_last^-1`.
    pub fn divide_and_drop_last(&self, tables: &[&NttTable]) -> Self {
        let last_index = self.limbs.len() - 1;
        let q_last = tables[last_index].modulus();
        let last: Vec<i64> = self.limbs[last_index]
            .iter()
            .map(|&c| center(c, q_last))
            .collect();

        let limbs = self.limbs[..last_index]
            .iter()
            .zip(tables)
            .map(|(limb, table)| {
                let q = table.modulus();
                let q_last_inv = inv_mod(q_last % q, q);
                limb.iter()
                    .zip(&last)
                    .map(|(&c, &l)| mul_mod(sub_mod(c, reduce_i64(l, q), q), q_last_inv, q))
                    .collect()
            })
            .collect();
        Self { limbs }
    }

    fn zip_with(
        &self,
        other: &Self,
        tables: &[&NttTable],
        op: impl Fn(u64, u64, u64) -> u64,
    ) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(&other.limbs)
            .zip(tables)
            .map(|((a, b), table)| {
                let q = table.modulus();
                a.iter().zip(b).map(|(&x, &y)| op(x, y, q)).collect()
            })
            .collect();
        Self { limbs }
    }
}
