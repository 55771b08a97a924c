use std::collections::HashMap;
use std::sync::RwLock;

use super::TemplateStore;
use crate::crypto::EncryptedTemplate;
use crate::error::{BiometricError, BiometricResult};

/// Process-lifetime store with no persistence.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, EncryptedTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> BiometricError {
    BiometricError::StoreIo("template map lock poisoned".to_string())
}

impl TemplateStore for MemoryTemplateStore {
    fn put(&self, user_id: &str, template: &EncryptedTemplate) -> BiometricResult<()> {
        self.templates
            .write()
            .map_err(poisoned)?
            .insert(user_id.to_string(), template.clone());
        Ok(())
    }

    fn get(&self, user_id: &str) -> BiometricResult<Option<EncryptedTemplate>> {
        Ok(self
            .templates
            .read()
            .map_err(poisoned)?
            .get(user_id)
            .cloned())
    }

    fn list_identities(&self) -> BiometricResult<Vec<String>> {
        let mut ids: Vec<String> = self.templates.read().map_err(poisoned)?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_list() -> BiometricResult<()> {
        let store = MemoryTemplateStore::new();
        assert!(store.get("alice")?.is_none());

        store.put("carol", &EncryptedTemplate::from_blob("c1"))?;
        store.put("alice", &EncryptedTemplate::from_blob("a1"))?;
        assert_eq!(store.get("alice")?, Some(EncryptedTemplate::from_blob("a1")));
        assert_eq!(store.list_identities()?, vec!["alice", "carol"]);
        Ok(())
    }

    #[test]
    fn test_put_replaces() -> BiometricResult<()> {
        let store = MemoryTemplateStore::new();
        store.put("alice", &EncryptedTemplate::from_blob("old"))?;
        store.put("alice", &EncryptedTemplate::from_blob("new"))?;
        assert_eq!(store.get("alice")?.unwrap().as_str(), "new");
        assert_eq!(store.list_identities()?.len(), 1);
        Ok(())
    }
}
