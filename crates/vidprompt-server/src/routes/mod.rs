//! HTTP route handlers.

pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::state::AppState;

/// Room for the prompt field and multipart framing on top of the video itself.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit(state.config.max_upload_bytes)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let id = uuid::Uuid::new_v4().simple().to_string();
            info_span!(
                "request",
                id = %&id[..8],
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .with_state(state)
}

/// Request body cap for a given upload limit, saturating at `usize::MAX`.
fn body_limit(max_upload_bytes: u64) -> usize {
    usize::try_from(max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(jobs::routes())
        .merge(health::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_adds_form_overhead() {
        assert_eq!(body_limit(5 * 1024 * 1024), 6 * 1024 * 1024);
    }

    #[test]
    fn test_body_limit_saturates() {
        assert_eq!(body_limit(u64::MAX), usize::MAX);
        assert_eq!(body_limit(u64::MAX - FORM_OVERHEAD_BYTES + 1), usize::MAX);
    }
}
