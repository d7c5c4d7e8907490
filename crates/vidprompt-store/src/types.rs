//! Job record types.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vidprompt_core::{EditCommand, SourceFile};

/// Lifecycle status of an edit job.
///
/// `PENDING → PROCESSING → COMPLETED`, with `FAILED` reachable from either
/// non-terminal state. `COMPLETED` and `FAILED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a record in this status may move to `next`.
    ///
    /// Re-writing the current status is allowed so updates stay idempotent.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(StoreError::Corrupt(format!("unknown job status {}", other))),
        }
    }
}

/// Persisted record of one edit job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditJob {
    pub id: String,
    pub prompt: String,
    pub source_path: String,
    pub source_name: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<EditCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Follow-up ideas the oracle offered alongside the command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl EditJob {
    /// A freshly received job.
    pub fn pending(id: impl Into<String>, prompt: impl Into<String>, source: &SourceFile) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            prompt: prompt.into(),
            source_path: source.path_str(),
            source_name: source.original_name.clone(),
            status: JobStatus::Pending,
            command: None,
            reasoning: None,
            suggestions: Vec::new(),
            output_ref: None,
            output_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this record, enforcing the status machine.
    pub fn apply(&mut self, patch: &JobPatch) -> Result<(), StoreError> {
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    id: self.id.clone(),
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        if let Some(command) = &patch.command {
            self.command = Some(command.clone());
        }
        if let Some(reasoning) = &patch.reasoning {
            self.reasoning = Some(reasoning.clone());
        }
        if let Some(suggestions) = &patch.suggestions {
            self.suggestions = suggestions.clone();
        }
        if let Some(output_ref) = &patch.output_ref {
            self.output_ref = Some(output_ref.clone());
        }
        if let Some(output_url) = &patch.output_url {
            self.output_url = Some(output_url.clone());
        }
        if let Some(error) = &patch.error {
            self.error = Some(error.clone());
        }
        self.updated_at = now_millis();
        Ok(())
    }
}

/// Partial update of a job record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub command: Option<EditCommand>,
    pub reasoning: Option<String>,
    pub suggestions: Option<Vec<String>>,
    pub output_ref: Option<String>,
    pub output_url: Option<String>,
    pub error: Option<String>,
}

impl JobPatch {
    pub fn processing(
        command: EditCommand,
        reasoning: Option<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            command: Some(command),
            reasoning,
            suggestions: Some(suggestions),
            ..Default::default()
        }
    }

    pub fn completed(output_ref: impl Into<String>, output_url: Option<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            output_ref: Some(output_ref.into()),
            output_url,
            ..Default::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// A job store write or read did not happen.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("persistence unavailable: {0}")]
    Unavailable(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("job {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("corrupt job record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
