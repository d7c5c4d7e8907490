//! Translation types.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vidprompt_core::EditCommand;

/// Oracle provider. Both speak the OpenAI chat-completions format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    OpenAI,
    Groq,
}

impl OracleProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "https://api.openai.com/v1",
            OracleProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }
}

impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleProvider::OpenAI => write!(f, "openai"),
            OracleProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Result of translating one prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    /// Validated actions in the oracle's order.
    pub command: EditCommand,
    pub reasoning: Option<String>,
    pub suggestions: Vec<String>,
    /// Candidates rejected by schema validation.
    pub dropped: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Network failure, timeout, quota, or no credentials.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The oracle answered with something other than `{"actions": [...]}`.
    #[error("malformed oracle response: {0}")]
    MalformedOracleResponse(String),
}
