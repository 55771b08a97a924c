//! Word-sized modular arithmetic and NTT-friendly prime generation.
//!
//! All moduli are at most 60 bits, so sums of two residues never overflow a
//! `u64` and products fit in a `u128`.

use super::CkksError;

pub(crate) fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let sum = a + b;
    if sum >= q {
        sum - q
    } else {
        sum
    }
}

pub(crate) fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        a + q - b
    }
}

pub(crate) fn neg_mod(a: u64, q: u64) -> u64 {
    if a == 0 {
        0
    } else {
        q - a
    }
}

pub(crate) fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

pub(crate) fn pow_mod(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let mut result = 1u64 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, q);
        }
        base = mul_mod(base, base, q);
        exp >>= 1;
    }
    result
}

/// Inverse modulo a prime (Fermat).
pub(crate) fn inv_mod(a: u64, q: u64) -> u64 {
    pow_mod(a, q - 2, q)
}

/// Reduce a signed integer into `[0, q)`.
pub(crate) fn reduce_i64(value: i64, q: u64) -> u64 {
    (value as i128).rem_euclid(q as i128) as u64
}

/// Lift a residue to the symmetric interval `(-q/2, q/2]`.
pub(crate) fn center(value: u64, q: u64) -> i64 {
    if value > q / 2 {
        value as i64 - q as i64
    } else {
        value as i64
    }
}

/// Deterministic Miller-Rabin for 64-bit integers.
pub(crate) fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut r = 0;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Generate distinct primes `q ≡ 1 (mod 2n)`, one per requested bit size.
///
/// Primes are taken in descending order starting just below `2^bits`, so the
/// same request always yields the same chain.
pub(crate) fn generate_ntt_primes(bit_sizes: &[u32], n: usize) -> Result<Vec<u64>, CkksError> {
    let step = 2 * n as u64;
    let mut chosen: Vec<u64> = Vec::with_capacity(bit_sizes.len());

    for &bits in bit_sizes {
        let upper = 1u64 << bits;
        let lower = 1u64 << (bits - 1);
        // 2^bits is a multiple of 2n, so this is the largest candidate below it.
        let mut candidate = upper - step + 1;
        loop {
            if candidate <= lower {
                return Err(CkksError::InvalidParameters(format!(
                    "not enough {bits}-bit primes congruent to 1 mod {step}"
                )));
            }
            if !chosen.contains(&candidate) && is_prime(candidate) {
                chosen.push(candidate);
                break;
            }
            candidate -= step;
        }
    }

    Ok(chosen)
}

/// Primitive `2n`-th root of unity modulo `q`, chosen deterministically.
pub(crate) fn primitive_root_2n(n: usize, q: u64) -> u64 {
    let order = 2 * n as u64;
    let exponent = (q - 1) / order;
    (2..q)
        .map(|g| pow_mod(g, exponent, q))
        .find(|&psi| pow_mod(psi, n as u64, q) == q - 1)
        .unwrap_or(1)
}
