//! Prompt translation: free text in, validated edit command out.
//!
//! The language model is an untrusted oracle. Its reply must be a JSON object
//! with an `actions` array; every entry is checked against the action schema
//! and dropped if invalid before anything reaches the render engine.

pub mod config;
pub mod instructions;
pub mod oracle;
pub mod translator;
pub mod types;

pub use config::{redact_url, OracleConfig, OracleConfigSummary};
pub use oracle::{OpenAiCompatOracle, Oracle};
pub use translator::{sanitize, OracleTranslator, PromptTranslator};
pub use types::*;
