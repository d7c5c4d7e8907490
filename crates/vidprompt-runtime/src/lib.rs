//! Job runtime — drives one edit job from prompt to rendered output.
//!
//! Validation happens before anything is allocated. After that every outcome,
//! including cancellation, is recorded against the job on a best-effort basis.

pub mod orchestrator;
pub mod types;

pub use orchestrator::JobOrchestrator;
pub use types::*;
