//! Key generation, encryption and homomorphic evaluation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::arith::{generate_ntt_primes, pow_mod};
use super::ciphertext::Ciphertext;
use super::encoding::Encoder;
use super::keys::{sample_error, sample_ternary, PublicKey, SecretKey, SwitchingKey};
use super::ntt::NttTable;
use super::params::CkksParams;
use super::poly::RnsPoly;
use super::CkksError;

const SNAPSHOT_VERSION: u32 = 1;

/// Relative tolerance when checking that two operands share a scale.
const SCALE_TOLERANCE: f64 = 1e-6;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    params: &'a CkksParams,
    moduli: Vec<u64>,
    public_key: &'a PublicKey,
    relin_key: &'a SwitchingKey,
    rotation_keys: &'a BTreeMap<usize, SwitchingKey>,
    secret_key: Option<&'a SecretKey>,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    params: CkksParams,
    moduli: Vec<u64>,
    public_key: PublicKey,
    relin_key: SwitchingKey,
    rotation_keys: BTreeMap<usize, SwitchingKey>,
    secret_key: Option<SecretKey>,
}

/// Parameters plus key material. Immutable once built and safe to share
/// across threads behind an `Arc`.
pub struct CkksContext {
    params: CkksParams,
    /// One table per prime: data primes first, special prime last.
    tables: Vec<NttTable>,
    encoder: Encoder,
    public_key: PublicKey,
    relin_key: SwitchingKey,
    /// Keyed by the step reduced into `[0, slots)`.
    rotation_keys: BTreeMap<usize, SwitchingKey>,
    secret_key: Option<SecretKey>,
    fingerprint: [u8; 32],
}

impl fmt::Debug for CkksContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CkksContext")
            .field("params", &self.params)
            .field("has_secret_key", &self.secret_key.is_some())
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}

impl CkksContext {
    /// Generate fresh keys for `params`.
    pub fn new(params: CkksParams) -> Result<Self, CkksError> {
        params.validate()?;
        let n = params.poly_degree;
        let moduli = generate_ntt_primes(&params.coeff_bit_sizes, n)?;
        let tables: Vec<NttTable> = moduli.iter().map(|&q| NttTable::new(n, q)).collect();

        let mut rng = rand::rng();
        let all: Vec<&NttTable> = tables.iter().collect();
        let data = &all[..all.len() - 1];

        let secret_key = SecretKey::generate(n, &mut rng);
        let public_key = PublicKey::generate(&secret_key, data, &mut rng)?;

        let s = secret_key.to_poly(&all);
        let s_squared = s.mul(&s, &all);
        let relin_key = SwitchingKey::generate(&secret_key, &s_squared, &all, &mut rng)?;

        let slots = params.slots();
        let mut rotation_keys = BTreeMap::new();
        for &step in &params.rotation_steps {
            let normalized = normalize_step(step, slots);
            if rotation_keys.contains_key(&normalized) {
                continue;
            }
            let galois = galois_element(normalized, n);
            let rotated = s.automorphism(galois, &all);
            let key = SwitchingKey::generate(&secret_key, &rotated, &all, &mut rng)?;
            rotation_keys.insert(normalized, key);
        }

        let fingerprint = compute_fingerprint(&params, &moduli, &public_key)?;
        debug!(
            poly_degree = n,
            primes = moduli.len(),
            rotation_keys = rotation_keys.len(),
            "generated CKKS keys"
        );

        Ok(Self {
            encoder: Encoder::new(n),
            params,
            tables,
            public_key,
            relin_key,
            rotation_keys,
            secret_key: Some(secret_key),
            fingerprint,
        })
    }

    /// Serialize parameters and evaluation keys, and the secret key when
    /// `include_secret` is set.
    pub fn serialize(&self, include_secret: bool) -> Result<Vec<u8>, CkksError> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            params: &self.params,
            moduli: self.moduli(),
            public_key: &self.public_key,
            relin_key: &self.relin_key,
            rotation_keys: &self.rotation_keys,
            secret_key: if include_secret {
                self.secret_key.as_ref()
            } else {
                None
            },
        };
        Ok(bincode::serialize(&snapshot)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, CkksError> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CkksError::Malformed(format!(
                "unsupported context version {}",
                snapshot.version
            )));
        }

        let params = snapshot.params;
        params.validate()?;
        let n = params.poly_degree;
        let moduli = generate_ntt_primes(&params.coeff_bit_sizes, n)?;
        if moduli != snapshot.moduli {
            return Err(CkksError::Malformed(
                "stored moduli do not match the parameters".to_string(),
            ));
        }

        let tables: Vec<NttTable> = moduli.iter().map(|&q| NttTable::new(n, q)).collect();
        let all: Vec<&NttTable> = tables.iter().collect();
        let data = &all[..all.len() - 1];

        let keys_ok = snapshot.public_key.is_well_formed(n, data)
            && snapshot.relin_key.is_well_formed(n, &all)
            && snapshot
                .rotation_keys
                .values()
                .all(|key| key.is_well_formed(n, &all))
            && snapshot
                .secret_key
                .as_ref()
                .is_none_or(|key| key.is_well_formed(n));
        if !keys_ok {
            return Err(CkksError::Malformed(
                "key material does not match the parameters".to_string(),
            ));
        }

        let fingerprint = compute_fingerprint(&params, &moduli, &snapshot.public_key)?;

        Ok(Self {
            encoder: Encoder::new(n),
            params,
            tables,
            public_key: snapshot.public_key,
            relin_key: snapshot.relin_key,
            rotation_keys: snapshot.rotation_keys,
            secret_key: snapshot.secret_key,
            fingerprint,
        })
    }

    pub fn params(&self) -> &CkksParams {
        &self.params
    }

    pub fn slots(&self) -> usize {
        self.params.slots()
    }

    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Largest magnitude accepted for an encrypted value or plaintext constant.
    pub fn value_bound(&self) -> f64 {
        let headroom = self.params.coeff_bit_sizes[0] as i32 - self.params.scale_bits as i32 - 2;
        2f64.powi(headroom)
    }

    pub fn encrypt(&self, values: &[f64]) -> Result<Ciphertext, CkksError> {
        if values.is_empty() {
            return Err(CkksError::ValueOutOfRange(
                "cannot encrypt an empty vector".to_string(),
            ));
        }
        self.check_values(values)?;

        let n = self.params.poly_degree;
        let scale = self.params.scale();
        let message = self.encoder.encode(values, scale)?;

        let tables = self.level_tables(self.data_primes());
        let mut rng = rand::rng();
        let u = RnsPoly::from_signed(&sample_ternary(n, &mut rng), &tables);
        let e0 = RnsPoly::from_signed(&sample_error(n, &mut rng)?, &tables);
        let e1 = RnsPoly::from_signed(&sample_error(n, &mut rng)?, &tables);
        let m = RnsPoly::from_signed(&message, &tables);

        let c0 = self
            .public_key
            .b
            .mul(&u, &tables)
            .add(&e0, &tables)
            .add(&m, &tables);
        let c1 = self.public_key.a.mul(&u, &tables).add(&e1, &tables);

        Ok(Ciphertext {
            c0,
            c1,
            scale,
            size: values.len(),
            fingerprint: self.fingerprint,
        })
    }

    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Vec<f64>, CkksError> {
        let secret = self.secret_key.as_ref().ok_or(CkksError::MissingSecretKey)?;
        self.check_owned(ciphertext)?;

        let phase = secret.phase(ciphertext.c0.limb(0), ciphertext.c1.limb(0), &self.tables[0]);
        Ok(self
            .encoder
            .decode(&phase, ciphertext.scale, ciphertext.size))
    }

    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, CkksError> {
        let (level, size) = self.check_binary(a, b)?;
        self.check_scales(a.scale, b.scale)?;
        let tables = self.level_tables(level);
        Ok(Ciphertext {
            c0: a.c0.truncated(level).add(&b.c0.truncated(level), &tables),
            c1: a.c1.truncated(level).add(&b.c1.truncated(level), &tables),
            scale: a.scale,
            size,
            fingerprint: self.fingerprint,
        })
    }

    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, CkksError> {
        let (level, size) = self.check_binary(a, b)?;
        self.check_scales(a.scale, b.scale)?;
        let tables = self.level_tables(level);
        Ok(Ciphertext {
            c0: a.c0.truncated(level).sub(&b.c0.truncated(level), &tables),
            c1: a.c1.truncated(level).sub(&b.c1.truncated(level), &tables),
            scale: a.scale,
            size,
            fingerprint: self.fingerprint,
        })
    }

    /// Slot-wise product, relinearized and rescaled by one prime.
    pub fn mul(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, CkksError> {
        let (level, size) = self.check_binary(a, b)?;
        if level < 2 {
            return Err(CkksError::DepthExhausted);
        }
        let tables = self.level_tables(level);
        let (a0, a1) = (a.c0.truncated(level), a.c1.truncated(level));
        let (b0, b1) = (b.c0.truncated(level), b.c1.truncated(level));

        let d0 = a0.mul(&b0, &tables);
        let d1 = a0.mul(&b1, &tables).add(&a1.mul(&b0, &tables), &tables);
        let d2 = a1.mul(&b1, &tables);

        let (k0, k1) = self.relin_key.switch(&d2, &self.all_tables())?;
        let c0 = d0.add(&k0, &tables);
        let c1 = d1.add(&k1, &tables);

        let q_last = tables[level - 1].modulus() as f64;
        Ok(Ciphertext {
            c0: c0.divide_and_drop_last(&tables),
            c1: c1.divide_and_drop_last(&tables),
            scale: a.scale * b.scale / q_last,
            size,
            fingerprint: self.fingerprint,
        })
    }

    /// Add the constant `value` to every slot.
    pub fn add_plain(&self, ciphertext: &Ciphertext, value: f64) -> Result<Ciphertext, CkksError> {
        self.check_owned(ciphertext)?;
        self.check_values(&[value])?;
        let tables = self.level_tables(ciphertext.c0.levels());
        let constant = (value * ciphertext.scale).round() as i128;
        Ok(Ciphertext {
            c0: ciphertext.c0.add_constant(constant, &tables),
            c1: ciphertext.c1.clone(),
            scale: ciphertext.scale,
            size: ciphertext.size,
            fingerprint: self.fingerprint,
        })
    }

    /// Multiply every slot by the constant `value`; consumes one level and
    /// keeps the scale.
    pub fn mul_plain(&self, ciphertext: &Ciphertext, value: f64) -> Result<Ciphertext, CkksError> {
        self.check_owned(ciphertext)?;
        self.check_values(&[value])?;
        let level = ciphertext.c0.levels();
        if level < 2 {
            return Err(CkksError::DepthExhausted);
        }
        let tables = self.level_tables(level);
        let q_last = tables[level - 1].modulus();
        let factor = (value * q_last as f64).round() as i128;

        Ok(Ciphertext {
            c0: ciphertext
                .c0
                .mul_scalar(factor, &tables)
                .divide_and_drop_last(&tables),
            c1: ciphertext
                .c1
                .mul_scalar(factor, &tables)
                .divide_and_drop_last(&tables),
            scale: ciphertext.scale,
            size: ciphertext.size,
            fingerprint: self.fingerprint,
        })
    }

    /// Rotate all slots left by `step` (negative steps rotate right); slot
    /// `t` of the result holds slot `t + step` of the input.
    pub fn rotate(&self, ciphertext: &Ciphertext, step: i64) -> Result<Ciphertext, CkksError> {
        self.check_owned(ciphertext)?;
        let normalized = normalize_step(step, self.slots());
        if normalized == 0 {
            return Ok(ciphertext.clone());
        }
        let key = self
            .rotation_keys
            .get(&normalized)
            .ok_or(CkksError::MissingRotationKey(step))?;

        let galois = galois_element(normalized, self.params.poly_degree);
        let tables = self.level_tables(ciphertext.c0.levels());
        let c0 = ciphertext.c0.automorphism(galois, &tables);
        let c1 = ciphertext.c1.automorphism(galois, &tables);
        let (k0, k1) = key.switch(&c1, &self.all_tables())?;

        Ok(Ciphertext {
            c0: c0.add(&k0, &tables),
            c1: k1,
            scale: ciphertext.scale,
            size: ciphertext.size,
            fingerprint: self.fingerprint,
        })
    }

    /// Structural checks for a ciphertext that arrived from outside.
    pub(crate) fn validate_ciphertext(&self, ciphertext: &Ciphertext) -> Result<(), CkksError> {
        self.check_owned(ciphertext)?;
        let levels = ciphertext.c0.levels();
        let tables = self.level_tables(levels.min(self.data_primes()));
        let degree = self.params.poly_degree;
        let well_formed = (1..=self.data_primes()).contains(&levels)
            && ciphertext.c1.levels() == levels
            && ciphertext.c0.is_reduced(degree, &tables)
            && ciphertext.c1.is_reduced(degree, &tables)
            && ciphertext.scale.is_finite()
            && ciphertext.scale > 0.0
            && (1..=self.slots()).contains(&ciphertext.size);
        if well_formed {
            Ok(())
        } else {
            Err(CkksError::Malformed(
                "ciphertext does not match the context parameters".to_string(),
            ))
        }
    }

    fn moduli(&self) -> Vec<u64> {
        self.tables.iter().map(NttTable::modulus).collect()
    }

    fn data_primes(&self) -> usize {
        self.tables.len() - 1
    }

    fn level_tables(&self, level: usize) -> Vec<&NttTable> {
        self.tables[..level].iter().collect()
    }

    fn all_tables(&self) -> Vec<&NttTable> {
        self.tables.iter().collect()
    }

    fn check_owned(&self, ciphertext: &Ciphertext) -> Result<(), CkksError> {
        if ciphertext.fingerprint == self.fingerprint {
            Ok(())
        } else {
            Err(CkksError::ContextMismatch)
        }
    }

    fn check_values(&self, values: &[f64]) -> Result<(), CkksError> {
        let bound = self.value_bound();
        match values.iter().find(|v| !v.is_finite() || v.abs() > bound) {
            Some(value) => Err(CkksError::ValueOutOfRange(format!(
                "{value} is not a finite number within ±{bound}"
            ))),
            None => Ok(()),
        }
    }

    /// Common checks for two-operand operations; returns the shared level
    /// and vector size.
    fn check_binary(&self, a: &Ciphertext, b: &Ciphertext) -> Result<(usize, usize), CkksError> {
        self.check_owned(a)?;
        self.check_owned(b)?;
        if a.size != b.size {
            return Err(CkksError::SizeMismatch {
                left: a.size,
                right: b.size,
            });
        }
        Ok((a.c0.levels().min(b.c0.levels()), a.size))
    }

    fn check_scales(&self, left: f64, right: f64) -> Result<(), CkksError> {
        if ((left - right) / left).abs() > SCALE_TOLERANCE {
            return Err(CkksError::ScaleMismatch { left, right });
        }
        Ok(())
    }
}

fn normalize_step(step: i64, slots: usize) -> usize {
    step.rem_euclid(slots as i64) as usize
}

/// `5^step mod 2n`: the automorphism that rotates slots by `step`.
fn galois_element(step: usize, n: usize) -> usize {
    pow_mod(5, step as u64, 2 * n as u64) as usize
}

fn compute_fingerprint(
    params: &CkksParams,
    moduli: &[u64],
    public_key: &PublicKey,
) -> Result<[u8; 32], CkksError> {
    let mut hasher = Sha256::new();
    hasher.update(bincode::serialize(params)?);
    for q in moduli {
        hasher.update(q.to_le_bytes());
    }
    hasher.update(bincode::serialize(public_key)?);
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    fn context() -> &'static CkksContext {
        static CONTEXT: OnceLock<CkksContext> = OnceLock::new();
        CONTEXT.get_or_init(|| {
            let params = CkksParams {
                poly_degree: 1024,
                coeff_bit_sizes: vec![60, 40, 40, 60],
                scale_bits: 40,
                rotation_steps: vec![1, -1],
            };
            CkksContext::new(params).unwrap()
        })
    }

    fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tolerance, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_encrypt_decrypt() {
        let ctx = context();
        let values = [0.5, -0.25, 1.5, 100.0, 0.0];
        let ct = ctx.encrypt(&values).unwrap();
        assert_eq!(ct.size(), 5);
        assert_close(&ctx.decrypt(&ct).unwrap(), &values, 1e-6);
    }

    #[test]
    fn test_add_sub_mul() {
        let ctx = context();
        let a = ctx.encrypt(&[0.5, 0.25, 1.5]).unwrap();
        let b = ctx.encrypt(&[0.5, 0.3, -0.4]).unwrap();

        assert_close(&ctx.decrypt(&ctx.add(&a, &b).unwrap()).unwrap(), &[1.0, 0.55, 1.1], 1e-6);
        assert_close(&ctx.decrypt(&ctx.sub(&a, &b).unwrap()).unwrap(), &[0.0, -0.05, 1.9], 1e-6);

        let product = ctx.mul(&a, &b).unwrap();
        assert_eq!(product.level(), 2);
        assert_close(&ctx.decrypt(&product).unwrap(), &[0.25, 0.075, -0.6], 1e-4);

        // Mixed levels: the fresh operand is truncated to match.
        let mixed = ctx.add(&product, &a).unwrap();
        assert_close(&ctx.decrypt(&mixed).unwrap(), &[0.75, 0.325, 0.9], 1e-4);
    }

    #[test]
    fn test_depth_is_bounded() {
        let ctx = context();
        let a = ctx.encrypt(&[1.0]).unwrap();
        let once = ctx.mul(&a, &a).unwrap();
        let twice = ctx.mul(&once, &once).unwrap();
        assert_close(&ctx.decrypt(&twice).unwrap(), &[1.0], 1e-3);
        assert!(matches!(ctx.mul(&twice, &twice), Err(CkksError::DepthExhausted)));
    }

    #[test]
    fn test_plain_ops() {
        let ctx = context();
        let ct = ctx.encrypt(&[0.2, 0.4, 0.6]).unwrap();
        let shifted = ctx.add_plain(&ct, 10.0).unwrap();
        let scaled = ctx.mul_plain(&shifted, 2.0).unwrap();
        assert_close(&ctx.decrypt(&scaled).unwrap(), &[20.4, 20.8, 21.2], 1e-4);
        assert!((scaled.scale() - ct.scale()).abs() < 1.0);
    }

    #[test]
    fn test_rotation() {
        let ctx = context();
        let ct = ctx.encrypt(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let left = ctx.rotate(&ct, 1).unwrap();
        assert_close(&ctx.decrypt(&left).unwrap(), &[2.0, 3.0, 4.0, 0.0], 1e-4);
        let right = ctx.rotate(&ct, -1).unwrap();
        assert_close(&ctx.decrypt(&right).unwrap(), &[0.0, 1.0, 2.0, 3.0], 1e-4);
        assert!(matches!(
            ctx.rotate(&ct, 2),
            Err(CkksError::MissingRotationKey(2))
        ));
    }

    #[test]
    fn test_size_mismatch_and_range_errors() {
        let ctx = context();
        let five = ctx.encrypt(&[0.0; 5]).unwrap();
        let seven = ctx.encrypt(&[0.0; 7]).unwrap();
        assert!(matches!(
            ctx.sub(&five, &seven),
            Err(CkksError::SizeMismatch { left: 5, right: 7 })
        ));
        assert!(matches!(
            ctx.encrypt(&[f64::NAN]),
            Err(CkksError::ValueOutOfRange(_))
        ));
        assert!(matches!(
            ctx.encrypt(&[1e9]),
            Err(CkksError::ValueOutOfRange(_))
        ));
        assert!(matches!(
            ctx.encrypt(&vec![0.0; ctx.slots() + 1]),
            Err(CkksError::TooManyValues { .. })
        ));
    }

    #[test]
    fn test_public_only_context() {
        let ctx = context();
        let public = CkksContext::deserialize(&ctx.serialize(false).unwrap()).unwrap();
        assert!(!public.has_secret_key());
        assert_eq!(public.fingerprint(), ctx.fingerprint());

        let ct = public.encrypt(&[0.1, 0.2]).unwrap();
        assert!(matches!(public.decrypt(&ct), Err(CkksError::MissingSecretKey)));
        assert_close(&ctx.decrypt(&ct).unwrap(), &[0.1, 0.2], 1e-6);
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let rendered = format!("{:?}", context());
        assert!(rendered.contains("has_secret_key: true"));
        assert!(!rendered.contains("coeffs"));
    }
}
