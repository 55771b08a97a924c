//! Key material and key switching.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::arith::{add_mod, center, mul_mod, reduce_i64};
use super::ntt::{pointwise_mul_add_assign, NttTable};
use super::poly::RnsPoly;
use super::CkksError;

/// Standard deviation of the discrete Gaussian error distribution.
const ERROR_STD_DEV: f64 = 3.2;

pub(crate) fn sample_ternary<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<i64> {
    (0..n).map(|_| rng.random_range(-1i64..=1)).collect()
}

pub(crate) fn sample_error<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Vec<i64>, CkksError> {
    let normal = Normal::new(0.0, ERROR_STD_DEV)
        .map_err(|err| CkksError::InvalidParameters(err.to_string()))?;
    Ok((0..n).map(|_| normal.sample(rng).round() as i64).collect())
}

pub(crate) fn sample_uniform<R: Rng + ?Sized>(
    n: usize,
    tables: &[&NttTable],
    rng: &mut R,
) -> RnsPoly {
    let limbs = tables
        .iter()
        .map(|table| {
            let q = table.modulus();
            (0..n).map(|_| rng.random_range(0..q)).collect()
        })
        .collect();
    RnsPoly::from_limbs(limbs)
}

/// Ternary secret `s`, kept as signed coefficients so it can be lifted into
/// any basis.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct SecretKey {
    coeffs: Vec<i64>,
}

impl SecretKey {
    pub fn generate<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        Self {
            coeffs: sample_ternary(n, rng),
        }
    }

    pub fn is_well_formed(&self, degree: usize) -> bool {
        self.coeffs.len() == degree && self.coeffs.iter().all(|c| (-1..=1).contains(c))
    }

    pub fn to_poly(&self, tables: &[&NttTable]) -> RnsPoly {
        RnsPoly::from_signed(&self.coeffs, tables)
    }

    /// `<c, (1, s)>` over a single modulus, returned centered.
    pub fn phase(&self, c0: &[u64], c1: &[u64], table: &NttTable) -> Vec<i64> {
        let q = table.modulus();
        let s: Vec<u64> = self.coeffs.iter().map(|&c| reduce_i64(c, q)).collect();
        table
            .multiply(c1, &s)
            .into_iter()
            .zip(c0)
            .map(|(a, &b)| center(add_mod(a, b, q), q))
            .collect()
    }
}

/// RLWE encryption of zero, `(b, a) = (-a*s + e, a)`, over the data primes.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct PublicKey {
    pub b: RnsPoly,
    pub a: RnsPoly,
}

impl PublicKey {
    pub fn generate<R: Rng + ?Sized>(
        secret: &SecretKey,
        tables: &[&NttTable],
        rng: &mut R,
    ) -> Result<Self, CkksError> {
        let n = secret.coeffs.len();
        let s = secret.to_poly(tables);
        let a = sample_uniform(n, tables, rng);
        let e = RnsPoly::from_signed(&sample_error(n, rng)?, tables);
        let b = a.mul(&s, tables).neg(tables).add(&e, tables);
        Ok(Self { b, a })
    }

    pub fn is_well_formed(&self, degree: usize, tables: &[&NttTable]) -> bool {
        [&self.b, &self.a]
            .iter()
            .all(|poly| poly.levels() == tables.len() && poly.is_reduced(degree, tables))
    }
}

/// Key switching key from `target` to `s`, one component per data prime.
///
/// Component `i` encrypts `P * target` in limb `i` only (`P` the special
/// prime), so a ciphertext digit taken modulo `q_i` can be multiplied in
/// without blowing up the noise. Limbs are stored in evaluation form over
/// the full basis, special prime last.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct SwitchingKey {
    b: Vec<RnsPoly>,
    a: Vec<RnsPoly>,
}

impl SwitchingKey {
    pub fn generate<R: Rng + ?Sized>(
        secret: &SecretKey,
        target: &RnsPoly,
        tables: &[&NttTable],
        rng: &mut R,
    ) -> Result<Self, CkksError> {
        let n = target.degree();
        let data_primes = tables.len() - 1;
        let special = tables[data_primes].modulus();
        let s = secret.to_poly(tables);

        let mut bs = Vec::with_capacity(data_primes);
        let mut as_ = Vec::with_capacity(data_primes);
        for i in 0..data_primes {
            let a = sample_uniform(n, tables, rng);
            let e = RnsPoly::from_signed(&sample_error(n, rng)?, tables);
            let mut b = a.mul(&s, tables).neg(tables).add(&e, tables);

            let q = tables[i].modulus();
            let factor = special % q;
            for (coeff, &t) in b.limb_mut(i).iter_mut().zip(target.limb(i)) {
                *coeff = add_mod(*coeff, mul_mod(factor, t, q), q);
            }

            bs.push(to_evaluation(b, tables));
            as_.push(to_evaluation(a, tables));
        }

        Ok(Self { b: bs, a: as_ })
    }

    pub fn is_well_formed(&self, degree: usize, tables: &[&NttTable]) -> bool {
        let digits = tables.len() - 1;
        self.b.len() == digits
            && self.a.len() == digits
            && self
                .b
                .iter()
                .chain(&self.a)
                .all(|poly| poly.levels() == tables.len() && poly.is_reduced(degree, tables))
    }

    /// Switch `poly` (coefficient form, over the first `level` data primes)
    /// to a pair `(d0, d1)` with `d0 + d1*s ≈ poly * target`.
    pub fn switch(
        &self,
        poly: &RnsPoly,
        tables: &[&NttTable],
    ) -> Result<(RnsPoly, RnsPoly), CkksError> {
        let level = poly.levels();
        let special_index = tables.len() - 1;
        if level == 0 || level > self.b.len() {
            return Err(CkksError::Malformed(format!(
                "cannot key switch a polynomial with {level} limbs"
            )));
        }

        let n = poly.degree();
        let basis: Vec<usize> = (0..level).chain(std::iter::once(special_index)).collect();
        let mut acc0 = vec![vec![0u64; n]; basis.len()];
        let mut acc1 = vec![vec![0u64; n]; basis.len()];

        for digit_index in 0..level {
            let q_digit = tables[digit_index].modulus();
            let digit: Vec<i64> = poly
                .limb(digit_index)
                .iter()
                .map(|&c| center(c, q_digit))
                .collect();

            for (slot, &limb) in basis.iter().enumerate() {
                let table = tables[limb];
                let q = table.modulus();
                let mut lifted: Vec<u64> = digit.iter().map(|&c| reduce_i64(c, q)).collect();
                table.forward(&mut lifted);
                let key_b = self.b[digit_index].limb(limb);
                let key_a = self.a[digit_index].limb(limb);
                pointwise_mul_add_assign(&mut acc0[slot], &lifted, key_b, q);
                pointwise_mul_add_assign(&mut acc1[slot], &lifted, key_a, q);
            }
        }

        let basis_tables: Vec<&NttTable> = basis.iter().map(|&limb| tables[limb]).collect();
        for (slot, table) in basis_tables.iter().enumerate() {
            table.inverse(&mut acc0[slot]);
            table.inverse(&mut acc1[slot]);
        }

        let d0 = RnsPoly::from_limbs(acc0).divide_and_drop_last(&basis_tables);
        let d1 = RnsPoly::from_limbs(acc1).divide_and_drop_last(&basis_tables);
        Ok((d0, d1))
    }
}

fn to_evaluation(poly: RnsPoly, tables: &[&NttTable]) -> RnsPoly {
    let mut poly = poly;
    for (index, table) in tables.iter().enumerate() {
        table.forward(poly.limb_mut(index));
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::super::arith::generate_ntt_primes;
    use super::*;

    #[test]
    fn test_ternary_and_error_are_small() {
        let mut rng = rand::rng();
        let ternary = sample_ternary(1024, &mut rng);
        assert!(ternary.iter().all(|c| (-1..=1).contains(c)));
        let error = sample_error(1024, &mut rng).unwrap();
        assert!(error.iter().all(|c| c.abs() < 40));
    }

    #[test]
    fn test_public_key_phase_is_small() {
        let n = 1024;
        let owned: Vec<NttTable> = generate_ntt_primes(&[60, 40], n)
            .unwrap()
            .into_iter()
            .map(|q| NttTable::new(n, q))
            .collect();
        let tables: Vec<&NttTable> = owned.iter().collect();
        let mut rng = rand::rng();

        let secret = SecretKey::generate(n, &mut rng);
        let public = PublicKey::generate(&secret, &tables, &mut rng).unwrap();

        // b + a*s = e
        let phase = secret.phase(public.b.limb(0), public.a.limb(0), tables[0]);
        assert!(phase.iter().all(|c| c.abs() < 40));
    }
}
