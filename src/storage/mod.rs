//! Template storage.
//!
//! Stores map a user id to its encrypted template blob. Two backends share
//! the [`TemplateStore`] contract: an embedded redb database for deployments
//! and an in-memory map whose contents live only as long as the process.

pub mod memory;
pub mod redb;

use std::sync::Arc;

use crate::crypto::EncryptedTemplate;
use crate::error::BiometricResult;
use crate::settings::{Settings, StoreKind};

pub use self::memory::MemoryTemplateStore;
pub use self::redb::RedbTemplateStore;

/// Identity -> encrypted template persistence.
///
/// `put` replaces any earlier template for the same id and becomes visible
/// atomically. Implementations must tolerate concurrent callers.
pub trait TemplateStore: Send + Sync {
    fn put(&self, user_id: &str, template: &EncryptedTemplate) -> BiometricResult<()>;

    fn get(&self, user_id: &str) -> BiometricResult<Option<EncryptedTemplate>>;

    /// All stored ids in ascending order.
    fn list_identities(&self) -> BiometricResult<Vec<String>>;
}

/// Open the backend `settings` selects.
pub fn open_store(settings: &Settings) -> BiometricResult<Arc<dyn TemplateStore>> {
    match settings.store() {
        StoreKind::Redb => Ok(Arc::new(RedbTemplateStore::open(settings.database_path())?)),
        StoreKind::Memory => {
            tracing::warn!("Using in-memory template store; enrollments are lost on restart");
            Ok(Arc::new(MemoryTemplateStore::new()))
        }
    }
}
