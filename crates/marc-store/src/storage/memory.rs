//! In-memory relay storage.

use std::sync::RwLock;

use async_trait::async_trait;
use marc_core::traits::{StateStorage, StorageError, StoreData};

/// In-memory storage implementation.
///
/// Useful for tests and throwaway relays.
/// Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RwLock<Option<StoreData>>,
    saves: RwLock<usize>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that already holds `data`, as if saved earlier.
    #[must_use]
    pub fn with_data(data: StoreData) -> Self {
        Self {
            document: RwLock::new(Some(data)),
            saves: RwLock::new(0),
        }
    }

    /// Last saved document.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Option<StoreData>, StorageError> {
        Ok(self
            .document
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .clone())
    }

    /// Number of successful saves so far.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn save_count(&self) -> Result<usize, StorageError> {
        Ok(*self
            .saves
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?)
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<StoreData>, StorageError> {
        self.snapshot()
    }

    async fn save(&self, data: &StoreData) -> Result<(), StorageError> {
        *self
            .document
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))? = Some(data.clone());

        *self
            .saves
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))? += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_last_save() {
        let storage = MemoryStorage::new();
        assert!(storage.load().await.unwrap().is_none());

        let data = StoreData {
            next_id: 12,
            ..StoreData::default()
        };
        storage.save(&data).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(data));
        assert_eq!(storage.save_count().unwrap(), 1);
    }

    #[test]
    fn seeded_storage_loads_its_document() {
        let data = StoreData {
            next_id: 3,
            ..StoreData::default()
        };
        let storage = MemoryStorage::with_data(data.clone());

        let loaded = tokio_test::block_on(storage.load()).unwrap();
        assert_eq!(loaded, Some(data));
        assert_eq!(storage.save_count().unwrap(), 0);
    }
}
