//! The oracle capability and its OpenAI-compatible implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::{redact_url, OracleConfig};
use crate::types::TranslationError;

/// An external inference service answering one system + user exchange.
///
/// Returns the raw text of the model's reply. Implementations do not retry.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TranslationError>;
}

/// Chat-completions client for OpenAI and Groq, in JSON-object mode.
pub struct OpenAiCompatOracle {
    client: Client,
    config: OracleConfig,
}

impl OpenAiCompatOracle {
    pub fn new(config: OracleConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }
}

#[async_trait]
impl Oracle for OpenAiCompatOracle {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TranslationError> {
        let resolved = self.config.resolve().ok_or_else(|| {
            TranslationError::OracleUnavailable(format!(
                "no API key configured for {}",
                self.config.provider
            ))
        })?;
        let url = format!("{}/chat/completions", resolved.base_url);
        let display_url = format!("{}/chat/completions", redact_url(&resolved.base_url));

        let body = json!({
            "model": resolved.model,
            "response_format": {"type": "json_object"},
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        debug!("Oracle request to {} with model {}", display_url, resolved.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", resolved.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                TranslationError::OracleUnavailable(format!(
                    "request to {} failed: {}",
                    display_url,
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TranslationError::OracleUnavailable(format!(
                "API error {}: {}",
                status,
                truncate(&text, 300)
            )));
        }

        let parsed: serde_json::Value = response.json().await.map_err(|e| {
            TranslationError::MalformedOracleResponse(format!(
                "completion body is not JSON: {}",
                e.without_url()
            ))
        })?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                TranslationError::MalformedOracleResponse("completion has no message content".into())
            })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 2), "he");
        assert_eq!(truncate("héllo", 2), "hé");
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let oracle = OpenAiCompatOracle::new(OracleConfig::default()).unwrap();
        let err = oracle.complete("sys", "hi").await.unwrap_err();
        assert!(matches!(err, TranslationError::OracleUnavailable(_)));
    }
}
