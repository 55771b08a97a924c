//! Encrypted template comparison.
//!
//! The decision is taken on the decrypted difference only; the decrypted sum
//! and product are kept as diagnostics.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ckks::{Ciphertext, CkksContext, CkksError};
use crate::error::BiometricResult;

/// Largest absolute per-coordinate difference still considered a match.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Matched,
    BiometricMismatch,
    UnknownIdentity,
    LengthMismatch,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Matched => "matched",
            MatchReason::BiometricMismatch => "biometric_mismatch",
            MatchReason::UnknownIdentity => "unknown_identity",
            MatchReason::LengthMismatch => "length_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    pub is_match: bool,
    pub reason: MatchReason,
    pub sums: Vec<f64>,
    pub products: Vec<f64>,
}

impl MatchDecision {
    pub fn unknown_identity() -> Self {
        Self::rejected(MatchReason::UnknownIdentity)
    }

    pub fn length_mismatch() -> Self {
        Self::rejected(MatchReason::LengthMismatch)
    }

    fn rejected(reason: MatchReason) -> Self {
        Self {
            is_match: false,
            reason,
            sums: Vec::new(),
            products: Vec::new(),
        }
    }
}

/// True when every difference is strictly below `epsilon` in magnitude.
pub fn within_tolerance(diffs: &[f64], epsilon: f64) -> bool {
    diffs.iter().all(|diff| diff.abs() < epsilon)
}

/// Plaintext form of the decision rule: equal lengths and every coordinate
/// within `epsilon`.
pub fn approximately_equal(a: &[f64], b: &[f64], epsilon: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b)
        .all(|(left, right)| (left - right).abs() < epsilon)
}

/// Compare a probe against a stored template under `context`.
///
/// Vectors of different length never match; that includes size mismatches
/// reported by the engine itself.
pub fn compare(
    probe: &Ciphertext,
    stored: &Ciphertext,
    context: &CkksContext,
    tolerance: f64,
) -> BiometricResult<MatchDecision> {
    if probe.size() != stored.size() {
        warn!(
            probe = probe.size(),
            stored = stored.size(),
            "Attempted to compare vectors of different sizes"
        );
        return Ok(MatchDecision::length_mismatch());
    }

    let (diffs, sums, products) = match evaluate(probe, stored, context) {
        Ok(values) => values,
        Err(CkksError::SizeMismatch { left, right }) => {
            warn!(left, right, "Engine rejected operands of different sizes");
            return Ok(MatchDecision::length_mismatch());
        }
        Err(error) => return Err(error.into()),
    };

    debug!(?diffs, "Decrypted differences");
    debug!(?sums, "Decrypted sums");
    debug!(?products, "Decrypted products");

    let is_match = within_tolerance(&diffs, tolerance);
    Ok(MatchDecision {
        is_match,
        reason: if is_match {
            MatchReason::Matched
        } else {
            MatchReason::BiometricMismatch
        },
        sums,
        products,
    })
}

type Decrypted = (Vec<f64>, Vec<f64>, Vec<f64>);

fn evaluate(
    probe: &Ciphertext,
    stored: &Ciphertext,
    context: &CkksContext,
) -> Result<Decrypted, CkksError> {
    let diff = context.sub(probe, stored)?;
    let sum = context.add(probe, stored)?;
    let product = context.mul(probe, stored)?;
    Ok((
        context.decrypt(&diff)?,
        context.decrypt(&sum)?,
        context.decrypt(&product)?,
    ))
}
