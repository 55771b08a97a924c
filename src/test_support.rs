//! Test-only helpers that keep production modules lean.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::ckks::{CkksContext, CkksParams};
use crate::error::BiometricResult;

pub mod context {
    use super::*;

    static TEST_CONTEXT: OnceCell<Arc<CkksContext>> = OnceCell::new();

    /// A reduced-size context shared by every caller in the process.
    /// Bypasses the on-disk context manager entirely.
    pub fn shared_test_context() -> BiometricResult<Arc<CkksContext>> {
        TEST_CONTEXT
            .get_or_try_init(|| Ok(Arc::new(CkksContext::new(CkksParams::for_tests())?)))
            .cloned()
    }
}

pub mod authenticator {
    use super::*;
    use crate::storage::{MemoryTemplateStore, TemplateStore};
    use crate::workflow::{Authenticator, TemplatePolicy};

    /// Authenticator over the shared test context with an empty memory store.
    pub fn memory_authenticator(dimension: usize) -> BiometricResult<Authenticator> {
        with_store(dimension, Arc::new(MemoryTemplateStore::new()))
    }

    pub fn with_store(
        dimension: usize,
        store: Arc<dyn TemplateStore>,
    ) -> BiometricResult<Authenticator> {
        Authenticator::new(
            context::shared_test_context()?,
            store,
            TemplatePolicy::new(dimension),
        )
    }
}
