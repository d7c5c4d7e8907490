//! VidPrompt Core — edit action schema, configuration, shared types.

pub mod action;
pub mod config;
pub mod error;
pub mod source;

pub use action::{validate, EditAction, EditCommand, FlipDirection, InvalidAction, ACTION_NAMES};
pub use config::{DataPaths, EngineSettings, VidPromptConfig};
pub use error::{Error, Result};
pub use source::SourceFile;
