use tracing::info;

use super::{normalize_user_id, Authenticator};
use crate::crypto::EncryptedTemplate;
use crate::error::BiometricResult;

impl Authenticator {
    /// Encrypt `vector` and store it as the template for `user_id`,
    /// replacing any earlier enrollment.
    pub fn enroll(&self, user_id: &str, vector: &[f64]) -> BiometricResult<()> {
        let user_id = normalize_user_id(user_id)?;
        let ciphertext = self.encrypt_vector(vector)?;
        let template = EncryptedTemplate::seal(&ciphertext)?;
        self.store.put(user_id, &template)?;

        info!(
            user_id,
            dimension = vector.len(),
            template_bytes = template.as_str().len(),
            "Enrolled biometric template"
        );
        Ok(())
    }
}
