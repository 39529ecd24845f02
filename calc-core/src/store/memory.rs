//! Process-local [`ResultStore`], the equivalent of a browser's local storage
//! key: records are kept as serialized JSON blobs, newest first.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::factory::{StoreConfig, StoreFactory};
use super::repository::{ResultStore, StoreError, effective_cap};
use crate::models::SavedResult;

#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    entries: Mutex<Vec<String>>,
    disabled: bool,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every operation with
    /// [`StoreError::Unavailable`], as storage does when disabled by the
    /// user agent.
    pub fn disabled() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            disabled: true,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, Vec<String>>, StoreError> {
        if self.disabled {
            return Err(StoreError::Unavailable("storage is disabled".to_string()));
        }
        self.entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn append(
        &self,
        record: SavedResult,
        cap: usize,
    ) -> Result<(), StoreError> {
        let blob = record.to_json()?;
        let mut entries = self.entries()?;
        entries.insert(0, blob);
        entries.truncate(effective_cap(cap));
        debug!(slug = %record.slug, stored = entries.len(), "saved result in memory");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedResult>, StoreError> {
        let entries = self.entries()?;
        entries
            .iter()
            .map(|blob| SavedResult::from_json(blob).map_err(StoreError::from))
            .collect()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries()?.clear();
        Ok(())
    }
}

/// Registers the in-memory backend under the name `memory`.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Box<dyn ResultStore>, StoreError> {
        Ok(Box::new(InMemoryResultStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{DerivedOutputs, InputState};

    fn record(n: i64) -> SavedResult {
        SavedResult {
            slug: "income-tax".to_string(),
            title: "Income tax".to_string(),
            inputs: InputState::default(),
            outputs: DerivedOutputs::new().with("net_tax", dec!(10640.00)),
            timestamp: n,
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryResultStore::new();
        store.append(record(1), 10).await.unwrap();
        store.append(record(2), 10).await.unwrap();

        let timestamps: Vec<_> = store.list().await.unwrap().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![2, 1]);
    }

    #[tokio::test]
    async fn fifty_first_record_evicts_the_oldest() {
        let store = InMemoryResultStore::new();
        for n in 1..=51 {
            store.append(record(n), 50).await.unwrap();
        }

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 50);
        assert_eq!(list[0].timestamp, 51);
        assert_eq!(list[49].timestamp, 2);
    }

    #[tokio::test]
    async fn zero_cap_keeps_only_the_newest() {
        let store = InMemoryResultStore::new();
        store.append(record(1), 0).await.unwrap();
        store.append(record(2), 0).await.unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].timestamp, 2);
    }

    #[tokio::test]
    async fn records_round_trip_through_json() {
        let store = InMemoryResultStore::new();
        store.append(record(7), 10).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![record(7)]);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = InMemoryResultStore::new();
        store.append(record(1), 10).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_store_is_unavailable() {
        let store = InMemoryResultStore::disabled();

        assert!(matches!(
            store.append(record(1), 10).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.list().await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn factory_creates_empty_store() {
        let store = MemoryStoreFactory
            .create(&StoreConfig::default())
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }
}
