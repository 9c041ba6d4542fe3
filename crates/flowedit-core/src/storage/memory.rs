//! In-memory configuration store.

use super::{BoxFuture, ConfigStore, StoreError, StoreResult};
use crate::config::ConfigDocument;
use std::sync::RwLock;

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<Option<ConfigDocument>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn save(&self, document: &ConfigDocument) -> BoxFuture<'_, StoreResult<()>> {
        let document = document.clone();
        Box::pin(async move {
            let mut slot = self
                .document
                .write()
                .map_err(|e| StoreError::Io(format!("Lock error: {}", e)))?;
            *slot = Some(document);
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'_, StoreResult<ConfigDocument>> {
        Box::pin(async move {
            let slot = self
                .document
                .read()
                .map_err(|e| StoreError::Io(format!("Lock error: {}", e)))?;
            slot.clone().ok_or(StoreError::NotFound)
        })
    }

    fn exists(&self) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let slot = self
                .document
                .read()
                .map_err(|e| StoreError::Io(format!("Lock error: {}", e)))?;
            Ok(slot.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoordPair, LineEntry};
    use crate::storage::block_on;

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let mut doc = ConfigDocument::default();
        doc.lines.insert(
            "line_1".to_string(),
            LineEntry {
                start: CoordPair(0.0, 0.0),
                end: CoordPair(3.0, 4.0),
            },
        );

        block_on(store.save(&doc)).unwrap();
        let loaded = block_on(store.load()).unwrap();

        assert_eq!(doc, loaded);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.load());

        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_exists() {
        let store = MemoryStore::new();

        assert!(!block_on(store.exists()).unwrap());
        block_on(store.save(&ConfigDocument::default())).unwrap();
        assert!(block_on(store.exists()).unwrap());
    }
}
