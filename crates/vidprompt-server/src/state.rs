//! Shared application state.

use std::sync::Arc;

use tracing::info;
use vidprompt_core::VidPromptConfig;
use vidprompt_render::HttpRenderEngine;
use vidprompt_runtime::JobOrchestrator;
use vidprompt_store::{open_job_store, JobStore};
use vidprompt_translate::{OpenAiCompatOracle, OracleConfig, OracleTranslator};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: VidPromptConfig,
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    ///
    /// The job store falls back to memory if the database cannot be opened.
    /// A missing oracle key is not an error here; jobs fail at translation.
    pub fn new(config: VidPromptConfig) -> reqwest::Result<Self> {
        let store = open_job_store(&config.data_paths.db);

        let oracle_config = OracleConfig::load(&config.data_paths.oracle_config_file);
        let oracle = OpenAiCompatOracle::new(oracle_config)?;
        let summary = oracle.config().summary();
        info!(
            "Oracle: {} / {} at {} (key configured: {})",
            summary.provider, summary.model, summary.base_url, summary.api_key_configured
        );
        let translator = OracleTranslator::new(Arc::new(oracle));

        let renderer = HttpRenderEngine::new(config.engine.clone())?;
        info!("Render engine: {}", renderer.endpoint());

        let orchestrator = JobOrchestrator::new(Arc::new(translator), Arc::new(renderer), store);
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    pub fn with_orchestrator(config: VidPromptConfig, orchestrator: JobOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        self.orchestrator.store()
    }
}
