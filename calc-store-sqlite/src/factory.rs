use async_trait::async_trait;
use calc_core::store::{StoreConfig, StoreFactory};
use calc_core::{ResultStore, StoreError};
use tracing::info;

use crate::repository::SqliteResultStore;

/// Turn a configured connection string into a sqlx URL.
///
/// Bare paths get `mode=rwc` so the file is created on first use.
fn database_url(connection_string: &str) -> String {
    match connection_string.trim() {
        "" | ":memory:" => "sqlite::memory:".to_string(),
        url if url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite:{}?mode=rwc", path),
    }
}

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`calc_core::store::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use calc_core::store::StoreRegistry;
/// use calc_store_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"results.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"` or an empty string for an ephemeral database.
    /// * A full `sqlite:` URL, passed through unchanged.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn ResultStore>, StoreError> {
        let url = database_url(&config.connection_string);
        let store = SqliteResultStore::new(&url, &config.namespace)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{e:#}")))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;
        info!(url = %url, namespace = %config.namespace, "Opened SQLite result store");
        Ok(Box::new(store))
    }
}

#[cfg(test)]
mod tests {
    use calc_core::store::{StoreConfig, StoreFactory};
    use pretty_assertions::assert_eq;

    use super::{SqliteStoreFactory, database_url};

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteStoreFactory.backend_name(), "sqlite");
    }

    #[test]
    fn connection_strings_map_to_urls() {
        assert_eq!(database_url(":memory:"), "sqlite::memory:");
        assert_eq!(database_url(""), "sqlite::memory:");
        assert_eq!(database_url("results.db"), "sqlite:results.db?mode=rwc");
        assert_eq!(database_url("sqlite:x.db"), "sqlite:x.db");
    }

    #[tokio::test]
    async fn creates_in_memory_store() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
            ..StoreConfig::default()
        };

        let result = SqliteStoreFactory.create(&config).await;
        assert!(
            result.is_ok(),
            "failed to create in-memory store: {:#?}",
            result.err()
        );
    }
}
