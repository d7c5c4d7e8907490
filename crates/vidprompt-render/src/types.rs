//! Render engine wire types and errors.

use serde::Serialize;
use thiserror::Error;

/// Marker the engine puts in `status` on success.
pub const SUCCESS_STATUS: &str = "success";

/// Where the rendered artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    /// Path or URL exactly as reported by the engine.
    pub reference: String,
    /// Client-resolvable URL, when one can be derived.
    pub url: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The engine answered but refused or failed the job. Displays the engine's detail.
    #[error("{detail}")]
    Rejected { detail: String },

    #[error("render engine did not return an output path")]
    MissingOutputReference,

    #[error("render engine at {endpoint} responded {status}: {detail}")]
    Http {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("render engine request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("render engine returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("cannot read source file {path}: {message}")]
    Source { path: String, message: String },
}
