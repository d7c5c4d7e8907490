//! SQLite-backed job store.
//!
//! One connection behind a mutex. Calls from async code hop onto tokio's
//! blocking pool so a slow disk never stalls the request executor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use vidprompt_core::EditCommand;

use crate::schema::{ADDED_COLUMNS, SCHEMA_SQL};
use crate::types::{EditJob, JobPatch, JobStatus, StoreError};
use crate::JobStore;

pub struct SqliteJobStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl SqliteJobStore {
    /// Open or create the job database.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/vidprompt.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let db_path = db_dir.join("vidprompt.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::Unavailable(format!("Schema init failed: {}", e)))?;
        Self::add_missing_columns(&conn)?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM edit_jobs", [], |row| row.get(0))?;
        info!(
            "SqliteJobStore initialized: {} jobs, path={}",
            count,
            db_path.display()
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn create_connection(db_path: &Path) -> Result<Connection, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(conn)
    }

    fn add_missing_columns(conn: &Connection) -> Result<(), StoreError> {
        let existing: Vec<String> = conn
            .prepare("PRAGMA table_info(edit_jobs)")?
            .query_map([], |row| row.get::<_, String>("name"))?
            .collect::<Result<_, _>>()?;
        for &(name, ty) in ADDED_COLUMNS {
            if !existing.iter().any(|c| c == name) {
                conn.execute_batch(&format!("ALTER TABLE edit_jobs ADD COLUMN {} {}", name, ty))?;
                info!("Added column {} to edit_jobs", name);
            }
        }
        Ok(())
    }

    fn encode_suggestions(job: &EditJob) -> Result<Option<String>, StoreError> {
        if job.suggestions.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&job.suggestions)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn insert(conn: &Connection, job: &EditJob) -> Result<(), StoreError> {
        let command_json = job
            .command
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let suggestions_json = Self::encode_suggestions(job)?;
        conn.prepare_cached(
            "INSERT INTO edit_jobs (id, prompt, source_path, source_name, status, command_json, \
             reasoning, suggestions_json, output_ref, output_url, error, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(id) DO NOTHING",
        )?
        .execute(params![
            job.id,
            job.prompt,
            job.source_path,
            job.source_name,
            job.status.as_str(),
            command_json,
            job.reasoning,
            suggestions_json,
            job.output_ref,
            job.output_url,
            job.error,
            job.created_at,
            job.updated_at,
        ])?;
        Ok(())
    }

    fn update(conn: &Connection, id: &str, patch: &JobPatch) -> Result<(), StoreError> {
        let mut job = Self::select(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        job.apply(patch)?;

        let command_json = job
            .command
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let suggestions_json = Self::encode_suggestions(&job)?;
        conn.prepare_cached(
            "UPDATE edit_jobs SET status = ?1, command_json = ?2, reasoning = ?3, \
             suggestions_json = ?4, output_ref = ?5, output_url = ?6, error = ?7, updated_at = ?8 \
             WHERE id = ?9",
        )?
        .execute(params![
            job.status.as_str(),
            command_json,
            job.reasoning,
            suggestions_json,
            job.output_ref,
            job.output_url,
            job.error,
            job.updated_at,
            id,
        ])?;
        debug!("Job {} stored as {}", id, job.status);
        Ok(())
    }

    fn select(conn: &Connection, id: &str) -> Result<Option<EditJob>, StoreError> {
        let row = conn
            .prepare_cached("SELECT * FROM edit_jobs WHERE id = ?1")?
            .query_row(params![id], |row| Ok(Self::row_to_job(row)))
            .optional()?;
        row.transpose()
    }

    fn row_to_job(row: &rusqlite::Row<'_>) -> Result<EditJob, StoreError> {
        let status: String = row.get("status")?;
        let command: Option<EditCommand> = row
            .get::<_, Option<String>>("command_json")?
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let suggestions: Vec<String> = row
            .get::<_, Option<String>>("suggestions_json")?
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?
            .unwrap_or_default();
        Ok(EditJob {
            id: row.get("id")?,
            prompt: row.get("prompt")?,
            source_path: row.get("source_path")?,
            source_name: row.get("source_name")?,
            status: status.parse::<JobStatus>()?,
            command,
            reasoning: row.get("reasoning")?,
            suggestions,
            output_ref: row.get("output_ref")?,
            output_url: row.get("output_url")?,
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&*guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn try_create(&self, job: &EditJob) -> Result<(), StoreError> {
        let job = job.clone();
        self.with_conn(move |conn| Self::insert(conn, &job)).await
    }

    async fn try_update(&self, id: &str, patch: &JobPatch) -> Result<(), StoreError> {
        let id = id.to_string();
        let patch = patch.clone();
        self.with_conn(move |conn| Self::update(conn, &id, &patch)).await
    }

    async fn get(&self, id: &str) -> Result<Option<EditJob>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| Self::select(conn, &id)).await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vidprompt_core::{EditAction, SourceFile};

    fn test_store() -> (SqliteJobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteJobStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn pending(id: &str) -> EditJob {
        EditJob::pending(
            id,
            "cut from 30 to 45",
            &SourceFile::new("/data/uploads/clip.mp4", "clip.mp4"),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (store, _dir) = test_store();
        store.try_create(&pending("job-1")).await.unwrap();

        let job = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.prompt, "cut from 30 to 45");
        assert_eq!(job.source_name, "clip.mp4");
        assert!(job.command.is_none());

        assert!(store.get("job-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, _dir) = test_store();
        store.try_create(&pending("job-1")).await.unwrap();

        let cmd = EditCommand::new(vec![EditAction::CutSection {
            start_time: 30.0,
            end_time: 45.0,
        }]);
        store
            .try_update(
                "job-1",
                &JobPatch::processing(
                    cmd.clone(),
                    Some("cut".into()),
                    vec!["add music".into(), "fade out the ending".into()],
                ),
            )
            .await
            .unwrap();
        store
            .try_update(
                "job-1",
                &JobPatch::completed("/out/clip.mp4", Some("http://engine/download/clip.mp4".into())),
            )
            .await
            .unwrap();

        let job = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.command, Some(cmd));
        assert_eq!(job.reasoning.as_deref(), Some("cut"));
        assert_eq!(
            job.suggestions,
            vec!["add music".to_string(), "fade out the ending".to_string()]
        );
        assert_eq!(job.output_ref.as_deref(), Some("/out/clip.mp4"));
        assert_eq!(
            job.output_url.as_deref(),
            Some("http://engine/download/clip.mp4")
        );
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let (store, _dir) = test_store();
        store.try_create(&pending("job-1")).await.unwrap();
        store
            .try_update("job-1", &JobPatch::failed("oracle unavailable"))
            .await
            .unwrap();

        // Idempotent re-write is fine, leaving FAILED is not.
        store
            .try_update("job-1", &JobPatch::failed("oracle unavailable"))
            .await
            .unwrap();
        let err = store
            .try_update(
                "job-1",
                &JobPatch::processing(EditCommand::default(), None, Vec::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let job = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("oracle unavailable"));
    }

    #[tokio::test]
    async fn test_update_missing_job() {
        let (store, _dir) = test_store();
        let err = store
            .try_update("nope", &JobPatch::failed("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteJobStore::open(dir.path()).unwrap();
            store.try_create(&pending("job-1")).await.unwrap();
        }
        let store = SqliteJobStore::open(dir.path()).unwrap();
        assert!(store.get("job-1").await.unwrap().is_some());
        assert_eq!(store.backend(), "sqlite");
        assert_eq!(store.db_path(), dir.path().join("vidprompt.db"));
    }

    #[tokio::test]
    async fn test_older_table_gains_suggestions_column() {
        let dir = TempDir::new().unwrap();
        {
            let conn = Connection::open(dir.path().join("vidprompt.db")).unwrap();
            conn.execute_batch(
                "CREATE TABLE edit_jobs (
                    id TEXT PRIMARY KEY, prompt TEXT NOT NULL, source_path TEXT NOT NULL,
                    source_name TEXT NOT NULL, status TEXT NOT NULL, command_json TEXT,
                    reasoning TEXT, output_ref TEXT, output_url TEXT, error TEXT,
                    created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL
                );
                INSERT INTO edit_jobs VALUES
                    ('old', 'p', '/in.mp4', 'in.mp4', 'FAILED', NULL, NULL, NULL, NULL,
                     'cancelled', 1, 1);",
            )
            .unwrap();
        }

        let store = SqliteJobStore::open(dir.path()).unwrap();
        let old = store.get("old").await.unwrap().unwrap();
        assert!(old.suggestions.is_empty());

        store.try_create(&pending("job-1")).await.unwrap();
        store
            .try_update(
                "job-1",
                &JobPatch::processing(EditCommand::default(), None, vec!["add music".into()]),
            )
            .await
            .unwrap();
        let job = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(job.suggestions, vec!["add music".to_string()]);
    }

    #[test]
    fn test_open_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        // A regular file where the db directory should be.
        let blocker = dir.path().join("db");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = crate::open_job_store(&blocker);
        assert_eq!(store.backend(), "memory");
    }
}
