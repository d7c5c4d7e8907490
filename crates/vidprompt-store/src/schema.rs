//! Database schema SQL for the job table.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS edit_jobs (
    id TEXT PRIMARY KEY,
    prompt TEXT NOT NULL,
    source_path TEXT NOT NULL,
    source_name TEXT NOT NULL,
    status TEXT NOT NULL,
    command_json TEXT,
    reasoning TEXT,
    suggestions_json TEXT,
    output_ref TEXT,
    output_url TEXT,
    error TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_edit_jobs_status ON edit_jobs(status);
CREATE INDEX IF NOT EXISTS idx_edit_jobs_created ON edit_jobs(created_at);
"#;

/// Columns added after the first release, with their declared type.
///
/// `CREATE TABLE IF NOT EXISTS` leaves an older table alone, so these are
/// added on open when missing.
pub const ADDED_COLUMNS: &[(&str, &str)] = &[("suggestions_json", "TEXT")];
