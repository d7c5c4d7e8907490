//! VidPrompt Store — best-effort persistence of edit job records.
//!
//! Writes report failure through `Result` and never panic. Callers log the
//! error and carry on; a lost write must not change a job's outcome.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use memory::MemoryJobStore;
pub use sqlite::SqliteJobStore;
pub use types::*;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

/// Durable-if-possible record of job identity, status and results.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record. Inserting an id that already exists is a no-op.
    async fn try_create(&self, job: &EditJob) -> Result<(), StoreError>;

    /// Merge `patch` into the record for `id`.
    async fn try_update(&self, id: &str, patch: &JobPatch) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<EditJob>, StoreError>;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}

/// Open the SQLite store in `db_dir`, falling back to memory if that fails.
pub fn open_job_store(db_dir: &Path) -> Arc<dyn JobStore> {
    match SqliteJobStore::open(db_dir) {
        Ok(store) => {
            tracing::debug!("Job records stored in {}", store.db_path().display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Job database unavailable ({}). Continuing with in-memory job records.",
                e
            );
            Arc::new(MemoryJobStore::new())
        }
    }
}
