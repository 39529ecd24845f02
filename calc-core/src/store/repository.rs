use async_trait::async_trait;
use thiserror::Error;

use crate::models::SavedResult;

/// Capacity used when none is configured.
pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Capped, newest-first list of saved calculator results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Inserts `record` at the front, then evicts from the back until at most
    /// `cap` records remain. A `cap` of zero behaves as one.
    async fn append(
        &self,
        record: SavedResult,
        cap: usize,
    ) -> Result<(), StoreError>;

    /// Every stored record, newest first.
    async fn list(&self) -> Result<Vec<SavedResult>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// The capacity actually enforced for a requested `cap`.
pub fn effective_cap(cap: usize) -> usize {
    cap.max(1)
}
