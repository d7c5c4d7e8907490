//! In-memory job store, used when the database cannot be opened.
//!
//! Holds at most `capacity` records. Once full, creating a job evicts the
//! least recently updated COMPLETED or FAILED records. Jobs still in flight
//! are never evicted, so the map can exceed the cap only while more than
//! `capacity` jobs are running at once.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::types::{EditJob, JobPatch, StoreError};
use crate::JobStore;

/// Default record cap for the fallback store.
pub const MAX_RECORDS: usize = 10_000;

pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, EditJob>>,
    capacity: usize,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::with_capacity(MAX_RECORDS)
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn try_create(&self, job: &EditJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job.id) {
            return Ok(());
        }
        if jobs.len() >= self.capacity {
            let excess = jobs.len() + 1 - self.capacity;
            evict_finished(&mut jobs, excess);
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn try_update(&self, id: &str, patch: &JobPatch) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        job.apply(patch)
    }

    async fn get(&self, id: &str) -> Result<Option<EditJob>, StoreError> {
        Ok(self.jobs.read().get(id).cloned())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Drop up to `count` terminal records, least recently updated first.
fn evict_finished(jobs: &mut HashMap<String, EditJob>, count: usize) {
    let mut finished: Vec<(i64, String)> = jobs
        .values()
        .filter(|job| job.status.is_terminal())
        .map(|job| (job.updated_at, job.id.clone()))
        .collect();
    finished.sort_unstable();
    for (_, id) in finished.into_iter().take(count) {
        jobs.remove(&id);
        debug!("Evicted job {} from the in-memory store", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;
    use vidprompt_core::{EditCommand, SourceFile};

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = MemoryJobStore::new();
        let source = SourceFile::new("/tmp/in.mp4", "in.mp4");
        let job = EditJob::pending("a", "trim it", &source);
        store.try_create(&job).await.unwrap();
        store
            .try_update(
                "a",
                &JobPatch::processing(EditCommand::default(), None, vec!["add music".into()]),
            )
            .await
            .unwrap();

        // A second create must not reset the record.
        store.try_create(&job).await.unwrap();
        let stored = store.get("a").await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
        assert_eq!(stored.suggestions, vec!["add music".to_string()]);
        assert_eq!(store.len(), 1);
    }

    fn job_at(id: &str, status: JobStatus, updated_at: i64) -> EditJob {
        let mut job = EditJob::pending(id, "trim it", &SourceFile::new("/tmp/in.mp4", "in.mp4"));
        job.status = status;
        job.updated_at = updated_at;
        job
    }

    #[tokio::test]
    async fn test_full_store_evicts_oldest_finished_jobs() {
        let store = MemoryJobStore::with_capacity(3);
        assert_eq!(store.capacity(), 3);
        store.try_create(&job_at("done-new", JobStatus::Completed, 300)).await.unwrap();
        store.try_create(&job_at("running", JobStatus::Processing, 100)).await.unwrap();
        store.try_create(&job_at("done-old", JobStatus::Failed, 200)).await.unwrap();

        store.try_create(&job_at("next", JobStatus::Pending, 400)).await.unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.get("done-old").await.unwrap().is_none());
        assert!(store.get("done-new").await.unwrap().is_some());
        assert!(store.get("running").await.unwrap().is_some());
        assert!(store.get("next").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_running_jobs_are_never_evicted() {
        let store = MemoryJobStore::with_capacity(2);
        store.try_create(&job_at("a", JobStatus::Pending, 1)).await.unwrap();
        store.try_create(&job_at("b", JobStatus::Processing, 2)).await.unwrap();
        store.try_create(&job_at("c", JobStatus::Pending, 3)).await.unwrap();

        assert_eq!(store.len(), 3);
        for id in ["a", "b", "c"] {
            assert!(store.get(id).await.unwrap().is_some());
        }

        // Re-creating a known id at capacity evicts nothing.
        store.try_update("a", &JobPatch::failed("cancelled")).await.unwrap();
        store.try_create(&job_at("b", JobStatus::Pending, 9)).await.unwrap();
        assert!(store.get("a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let store = MemoryJobStore::new();
        let err = store
            .try_update("missing", &JobPatch::failed("boom"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
