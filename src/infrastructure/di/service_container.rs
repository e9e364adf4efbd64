//! Service container for dependency injection
//!
//! Wires the configured row store and the tree-path service together.

use std::sync::Arc;

use crate::application::services::TreePathService;
use crate::config::Settings;
use crate::infrastructure::error::StoreResult;
use crate::infrastructure::sqlite::SqliteRowStore;
use crate::infrastructure::traits::RowStore;

/// Container holding the configured store and the services built on it.
pub struct ServiceContainer {
    /// Row store abstraction
    pub store: Arc<dyn RowStore>,
}

impl ServiceContainer {
    /// Create a container backed by the SQLite database named in `settings`.
    pub fn new(settings: &Settings) -> StoreResult<Self> {
        let store = SqliteRowStore::open(&settings.database, settings.schema_prefix.as_deref())?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Create a container with a custom store (for testing).
    pub fn with_store(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub fn tree_service(&self) -> TreePathService {
        TreePathService::new(Arc::clone(&self.store))
    }
}
