use tracing::{info, warn};

use super::{normalize_user_id, Authenticator};
use crate::crypto::{compare, MatchDecision};
use crate::error::BiometricResult;

impl Authenticator {
    /// Compare `vector` against the template enrolled for `user_id`.
    ///
    /// The stored template is only ever combined with the probe; nothing
    /// but the difference, sum and product is decrypted.
    pub fn verify(&self, user_id: &str, vector: &[f64]) -> BiometricResult<MatchDecision> {
        let user_id = normalize_user_id(user_id)?;
        let probe = self.encrypt_vector(vector)?;

        let Some(template) = self.store.get(user_id)? else {
            warn!(user_id, "Verification for unknown identity");
            return Ok(MatchDecision::unknown_identity());
        };
        let stored = template.open(&self.context)?;

        let decision = compare(&probe, &stored, &self.context, self.tolerance)?;
        if decision.is_match {
            info!(user_id, "Biometric verification succeeded");
        } else {
            warn!(user_id, reason = decision.reason.as_str(), "Biometric verification failed");
        }
        Ok(decision)
    }
}
