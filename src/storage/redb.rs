//! redb-backed template store.
//!
//! One table, `templates`, keyed by user id with the template blob as value.
//! Each `put` is its own write transaction; readers only ever see committed
//! state.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::TemplateStore;
use crate::crypto::EncryptedTemplate;
use crate::error::{BiometricError, BiometricResult};

const TEMPLATES: TableDefinition<&str, &[u8]> = TableDefinition::new("templates");

/// Thread-safe via internal Arc. Clone is cheap.
#[derive(Clone)]
pub struct RedbTemplateStore {
    db: Arc<Database>,
}

impl RedbTemplateStore {
    /// Open or create a database at the given path, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> BiometricResult<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|error| BiometricError::StoreIo(error.to_string()))?;
        }

        let db = Database::create(path)?;
        let store = Self::init(db)?;
        tracing::info!(path = %path.display(), "Opened template database");
        Ok(store)
    }

    /// Open an in-memory database, for tests.
    pub fn open_memory() -> BiometricResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> BiometricResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TEMPLATES)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl TemplateStore for RedbTemplateStore {
    fn put(&self, user_id: &str, template: &EncryptedTemplate) -> BiometricResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TEMPLATES)?;
            table.insert(user_id, template.as_bytes())?;
        }
        write_txn.commit()?;
        tracing::debug!(user_id, "Stored template");
        Ok(())
    }

    fn get(&self, user_id: &str) -> BiometricResult<Option<EncryptedTemplate>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TEMPLATES)?;

        match table.get(user_id)? {
            Some(value) => Ok(Some(EncryptedTemplate::from_stored(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_identities(&self) -> BiometricResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TEMPLATES)?;

        let mut ids = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }
}
