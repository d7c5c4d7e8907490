//! Orchestrator — runs edit jobs end to end.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use vidprompt_core::SourceFile;
use vidprompt_render::RenderEngine;
use vidprompt_store::{EditJob, JobPatch, JobStore};
use vidprompt_translate::PromptTranslator;

use crate::types::*;

/// Coordinates the translator, the render engine and the job store.
///
/// Each job makes at most one oracle call and at most one render submission.
/// Store failures are logged and never change a job's result.
pub struct JobOrchestrator {
    translator: Arc<dyn PromptTranslator>,
    renderer: Arc<dyn RenderEngine>,
    store: Arc<dyn JobStore>,
    ids: Arc<dyn IdSource>,
}

impl JobOrchestrator {
    pub fn new(
        translator: Arc<dyn PromptTranslator>,
        renderer: Arc<dyn RenderEngine>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            translator,
            renderer,
            store,
            ids: Arc::new(UuidIdSource),
        }
    }

    /// Replace the id source (deterministic ids in tests).
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Run one job to a terminal outcome.
    ///
    /// Validation failures return before an id is allocated. If `cancel` fires
    /// while the oracle or engine call is in flight, that call is dropped and
    /// the job is recorded as failed with reason `cancelled`.
    pub async fn run(
        &self,
        request: JobRequest,
        cancel: CancellationToken,
    ) -> Result<JobReceipt, JobError> {
        let (prompt, source) = request.validate()?;
        let job_id = self.ids.next_id();
        let span = info_span!("job", job_id = %job_id);
        self.execute(job_id, prompt, source, cancel)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        job_id: String,
        prompt: String,
        source: SourceFile,
        cancel: CancellationToken,
    ) -> Result<JobReceipt, JobError> {
        info!(
            "Job accepted: {:?} on {} ({} bytes)",
            prompt, source.original_name, source.size
        );
        self.record_create(&EditJob::pending(&job_id, &prompt, &source)).await;

        let translating = self.translator.translate(&prompt);
        let translated = match until_cancelled(&cancel, translating).await {
            Some(result) => result,
            None => return Err(self.cancelled(job_id).await),
        };
        let translation = match translated {
            Ok(t) => t,
            Err(e) => {
                error!("Prompt translation failed: {}", e);
                self.record_update(&job_id, &JobPatch::failed(e.to_string()))
                    .await;
                return Err(JobError::Translation { job_id, source: e });
            }
        };

        if translation.command.is_empty() {
            warn!("No usable actions in oracle reply; rendering unchanged");
        }
        self.record_update(
            &job_id,
            &JobPatch::processing(
                translation.command.clone(),
                translation.reasoning.clone(),
                translation.suggestions.clone(),
            ),
        )
        .await;
        info!("Job processing: {:?}", translation.command.names());

        let rendering = self.renderer.render(&source, &translation.command);
        let rendered = match until_cancelled(&cancel, rendering).await {
            Some(result) => result,
            None => return Err(self.cancelled(job_id).await),
        };

        match rendered {
            Ok(output) => {
                self.record_update(
                    &job_id,
                    &JobPatch::completed(&output.reference, output.url.clone()),
                )
                .await;
                info!(
                    "Job completed: {} ({})",
                    output.reference,
                    output.url.as_deref().unwrap_or("no download url")
                );
                Ok(JobReceipt {
                    job_id,
                    command: translation.command,
                    output_ref: output.reference,
                    output_url: output.url,
                })
            }
            Err(e) => {
                error!("Render failed: {}", e);
                self.record_update(&job_id, &JobPatch::failed(e.to_string()))
                    .await;
                Err(JobError::Render { job_id, source: e })
            }
        }
    }

    async fn cancelled(&self, job_id: String) -> JobError {
        warn!("Job cancelled");
        self.record_update(&job_id, &JobPatch::failed("cancelled")).await;
        JobError::Cancelled { job_id }
    }

    async fn record_create(&self, job: &EditJob) {
        if let Err(e) = self.store.try_create(job).await {
            warn!("Could not record new job: {}", e);
        }
    }

    async fn record_update(&self, job_id: &str, patch: &JobPatch) {
        if let Err(e) = self.store.try_update(job_id, patch).await {
            warn!("Could not record job update: {}", e);
        }
    }
}

/// `None` if `cancel` fires first; the pending future is dropped.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
