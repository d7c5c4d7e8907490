//! Runtime types.

use thiserror::Error;
use vidprompt_core::{EditCommand, SourceFile};
use vidprompt_render::RenderError;
use vidprompt_translate::TranslationError;

/// What a client submitted. Both parts are optional until validated.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub prompt: Option<String>,
    pub source: Option<SourceFile>,
}

impl JobRequest {
    pub fn new(prompt: impl Into<String>, source: SourceFile) -> Self {
        Self {
            prompt: Some(prompt.into()),
            source: Some(source),
        }
    }

    /// Trimmed prompt and source, or the first thing missing.
    pub fn validate(self) -> Result<(String, SourceFile), ValidationError> {
        let prompt = self
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::EmptyPrompt)?;
        let source = self.source.ok_or(ValidationError::MissingVideo)?;
        Ok((prompt, source))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Video file is required")]
    MissingVideo,
}

/// A completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReceipt {
    pub job_id: String,
    pub command: EditCommand,
    pub output_ref: String,
    pub output_url: Option<String>,
}

/// Why a job did not complete. Everything but `Validation` carries a job id.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{source}")]
    Translation {
        job_id: String,
        source: TranslationError,
    },

    #[error("{source}")]
    Render { job_id: String, source: RenderError },

    #[error("cancelled")]
    Cancelled { job_id: String },
}

impl JobError {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobError::Validation(_) => None,
            JobError::Translation { job_id, .. }
            | JobError::Render { job_id, .. }
            | JobError::Cancelled { job_id } => Some(job_id),
        }
    }

    /// True when the caller sent something unusable rather than the job failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, JobError::Validation(_))
    }
}

/// Allocates job identifiers.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
