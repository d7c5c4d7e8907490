//! Prompt translation and oracle output sanitizing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use vidprompt_core::{action, EditCommand};

use crate::instructions::system_instructions;
use crate::oracle::Oracle;
use crate::types::{Translation, TranslationError};

/// Turns a prompt into a validated edit command.
#[async_trait]
pub trait PromptTranslator: Send + Sync {
    /// `prompt` is already trimmed and non-empty.
    async fn translate(&self, prompt: &str) -> Result<Translation, TranslationError>;
}

/// Translator backed by an [`Oracle`]: one call, then [`sanitize`].
pub struct OracleTranslator {
    oracle: Arc<dyn Oracle>,
    instructions: String,
}

impl OracleTranslator {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            instructions: system_instructions(),
        }
    }
}

#[async_trait]
impl PromptTranslator for OracleTranslator {
    async fn translate(&self, prompt: &str) -> Result<Translation, TranslationError> {
        let raw = self.oracle.complete(&self.instructions, prompt).await?;
        debug!("Oracle replied with {} bytes", raw.len());

        let translation = sanitize(&raw)?;
        info!(
            "Translated prompt into {} action(s) {:?} ({} dropped)",
            translation.command.len(),
            translation.command.names(),
            translation.dropped
        );
        if let Some(reasoning) = &translation.reasoning {
            info!("Oracle reasoning: {}", reasoning);
        }
        if !translation.suggestions.is_empty() {
            info!("Oracle suggestions: {:?}", translation.suggestions);
        }
        Ok(translation)
    }
}

/// Parse an oracle payload and keep only schema-valid actions, in order.
///
/// The payload must be a JSON object with an `actions` array. Invalid entries
/// inside the array are dropped and logged, never fatal.
pub fn sanitize(payload: &str) -> Result<Translation, TranslationError> {
    let value: Value = serde_json::from_str(payload.trim()).map_err(|e| {
        TranslationError::MalformedOracleResponse(format!("reply is not JSON: {}", e))
    })?;
    let obj = value.as_object().ok_or_else(|| {
        TranslationError::MalformedOracleResponse("reply is not a JSON object".into())
    })?;
    let candidates = obj.get("actions").and_then(Value::as_array).ok_or_else(|| {
        TranslationError::MalformedOracleResponse("reply has no `actions` array".into())
    })?;

    let mut actions = Vec::with_capacity(candidates.len());
    let mut dropped = 0;
    for (index, candidate) in candidates.iter().enumerate() {
        match action::validate(candidate) {
            Ok(valid) => actions.push(valid),
            Err(e) => {
                dropped += 1;
                warn!(
                    index,
                    field = %e.field,
                    candidate = %candidate,
                    "Dropping invalid oracle action: {}",
                    e.reason
                );
            }
        }
    }

    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);
    let suggestions = obj
        .get("suggestions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Translation {
        command: EditCommand::new(actions),
        reasoning,
        suggestions,
        dropped,
    })
}
