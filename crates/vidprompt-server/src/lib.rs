//! VidPrompt server — HTTP surface over the job runtime.

pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

pub use routes::build_router;
pub use state::AppState;
