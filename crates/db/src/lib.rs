//! Document store for the bookshelf service: typed records, the
//! [`DocumentStore`] seam, and its MongoDB and in-memory backends.

use std::sync::Arc;

pub mod error;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod settings;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use settings::{DatabaseSettings, StoreBackend};
pub use store::{CollectionKind, DocumentStore, IndexSpec};

/// Shared handle to the configured store, cloned into every module.
pub type Database = Arc<dyn DocumentStore>;

/// Construct the store selected by `settings.backend`.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    match settings.backend {
        StoreBackend::Mongo => {
            tracing::info!(
                target: "bookshelf-db",
                uri = %settings.redacted_uri(),
                database = %settings.name,
                "connecting to MongoDB"
            );
            Ok(Arc::new(MongoStore::connect(settings).await?))
        }
        StoreBackend::Memory => {
            tracing::warn!(
                target: "bookshelf-db",
                "using in-memory document store; data does not survive restarts"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
