//! Enrollment and verification workflows.
//!
//! Both workflows validate and normalize the raw vector the same way before
//! the engine ever sees it. The [`Authenticator`] ties the shared context,
//! the template store and the template policy together.

mod enrollment;
mod verification;

use std::sync::Arc;

use crate::ckks::{Ciphertext, CkksContext};
use crate::crypto::DEFAULT_MATCH_TOLERANCE;
use crate::error::{BiometricError, BiometricResult};
use crate::settings::Settings;
use crate::storage::TemplateStore;

/// Fixed normalization applied to every vector before encryption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    Identity,
    /// Linear map of `[min, max]` onto `[0, 1]`. Values outside the range are
    /// mapped linearly, not clamped.
    MinMax { min: f64, max: f64 },
}

impl Normalization {
    pub fn min_max(min: f64, max: f64) -> BiometricResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(BiometricError::InvalidInput(format!(
                "normalization range must satisfy min < max, got [{min}, {max}]"
            )));
        }
        Ok(Normalization::MinMax { min, max })
    }

    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match *self {
            Normalization::Identity => values.to_vec(),
            Normalization::MinMax { min, max } => {
                let span = max - min;
                values.iter().map(|value| (value - min) / span).collect()
            }
        }
    }
}

/// Shape every template must have.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplatePolicy {
    pub dimension: usize,
    pub normalization: Normalization,
}

impl TemplatePolicy {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            normalization: Normalization::Identity,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Validate a raw vector and return its normalized form.
    pub fn prepare(&self, values: &[f64]) -> BiometricResult<Vec<f64>> {
        if values.is_empty() {
            return Err(BiometricError::InvalidInput(
                "vector must not be empty".to_string(),
            ));
        }
        if values.len() != self.dimension {
            return Err(BiometricError::InvalidInput(format!(
                "vector must have {} values, got {}",
                self.dimension,
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(BiometricError::InvalidInput(format!(
                "vector value at index {index} is not a finite number"
            )));
        }
        Ok(self.normalization.apply(values))
    }
}

/// Entry point for enrollment, verification and identity listing.
#[derive(Clone)]
pub struct Authenticator {
    context: Arc<CkksContext>,
    store: Arc<dyn TemplateStore>,
    policy: TemplatePolicy,
    tolerance: f64,
}

impl Authenticator {
    pub fn new(
        context: Arc<CkksContext>,
        store: Arc<dyn TemplateStore>,
        policy: TemplatePolicy,
    ) -> BiometricResult<Self> {
        if policy.dimension == 0 || policy.dimension > context.slots() {
            return Err(BiometricError::InvalidInput(format!(
                "template dimension must be between 1 and {}, got {}",
                context.slots(),
                policy.dimension
            )));
        }
        Ok(Self {
            context,
            store,
            policy,
            tolerance: DEFAULT_MATCH_TOLERANCE,
        })
    }

    /// Policy and tolerance as configured for the deployment.
    pub fn from_settings(
        context: Arc<CkksContext>,
        store: Arc<dyn TemplateStore>,
        settings: &Settings,
    ) -> BiometricResult<Self> {
        let normalization = match settings.normalize_range() {
            Some((min, max)) => Normalization::min_max(min, max)?,
            None => Normalization::Identity,
        };
        let policy = TemplatePolicy::new(settings.template_dimension()).with_normalization(normalization);
        Self::new(context, store, policy)?.with_tolerance(settings.match_tolerance())
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> BiometricResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(BiometricError::InvalidInput(format!(
                "match tolerance must be positive, got {tolerance}"
            )));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    pub fn policy(&self) -> &TemplatePolicy {
        &self.policy
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn list_identities(&self) -> BiometricResult<Vec<String>> {
        self.store.list_identities()
    }

    fn encrypt_vector(&self, values: &[f64]) -> BiometricResult<Ciphertext> {
        let normalized = self.policy.prepare(values)?;
        Ok(self.context.encrypt(&normalized)?)
    }
}

/// Trimmed, non-empty user id.
fn normalize_user_id(user_id: &str) -> BiometricResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(BiometricError::InvalidInput(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
