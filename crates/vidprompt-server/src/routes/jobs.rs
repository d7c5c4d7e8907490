//! Edit job routes: submit a prompt plus video, look up a job.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument, Span};
use vidprompt_runtime::{JobError, JobRequest};
use vidprompt_store::EditJob;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{id}", get(get_job))
}

/// POST /api/jobs — run one edit job and answer with its terminal outcome.
///
/// The job runs on its own task. If this request is dropped (client gone),
/// the drop guard cancels the job, which is then recorded as failed.
async fn create_job(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let received = upload::receive(
        multipart,
        &state.config.data_paths.uploads,
        state.config.max_upload_bytes,
    )
    .await?;
    let request = JobRequest::from(received);
    let stored_upload = request.source.as_ref().map(|s| s.path.clone());

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let job_state = state.clone();
    let outcome = tokio::spawn(
        async move { job_state.orchestrator.run(request, cancel).await }
            .instrument(Span::current()),
    )
    .await
    .map_err(|e| {
        error!("Job task ended abnormally: {}", e);
        ApiError::internal("Job execution failed")
    })?;

    match outcome {
        Ok(receipt) => Ok(Json(json!({
            "success": true,
            "jobId": receipt.job_id,
            "outputUrl": receipt.output_url,
        }))),
        Err(e) => {
            if let JobError::Validation(_) = &e {
                if let Some(path) = &stored_upload {
                    upload::remove_upload(path).await;
                }
                info!("Rejected job submission: {}", e);
            }
            Err(e.into())
        }
    }
}

/// GET /api/jobs/{id} — the stored job record.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EditJob>, ApiError> {
    match state.store().get(&id).await {
        Ok(Some(job)) => Ok(Json(job)),
        Ok(None) => Err(ApiError::not_found("Job not found")),
        Err(e) => {
            error!("Job lookup failed for {}: {}", id, e);
            Err(ApiError::internal(e.to_string()))
        }
    }
}
