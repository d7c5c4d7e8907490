//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 100;

/// Environment variables consulted, in order, for the render engine API key.
pub const ENGINE_API_KEY_VARS: &[&str] = &[
    "PYTHON_BACKEND_API_KEY",
    "PYTHON_API_KEY",
    "ENGINE_API_KEY",
    "API_KEY",
];

/// Paths to all VidPrompt data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Uploaded source videos (`data/uploads/`).
    pub uploads: PathBuf,
    /// Job database directory (`data/db/`).
    pub db: PathBuf,
    /// Oracle configuration (`data/oracle-config.json`).
    pub oracle_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            uploads: root.join("uploads"),
            db: root.join("db"),
            oracle_config_file: root.join("oracle-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::create_dir_all(&self.db)?;
        Ok(())
    }
}

/// How to reach the external render engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Full URL of the processing endpoint.
    pub endpoint: String,
    /// Prefix under which the engine serves rendered files (`<base>/download/<name>`).
    pub download_base: Option<String>,
    /// Sent as `x-api-key` when present.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Whole-request timeout. Renders are slow, so this is minutes, not seconds.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl EngineSettings {
    /// Settings for an engine rooted at `base_url` with default timeouts.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            endpoint: format!("{}/process", base),
            download_base: Some(base.to_string()),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// `PYTHON_BACKEND` names the full endpoint and wins over `ENGINE_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let engine_base = get("ENGINE_URL").unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string());
        let mut settings = Self::for_base_url(&engine_base);

        if let Some(endpoint) = get("PYTHON_BACKEND") {
            settings.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(public) = get("ENGINE_PUBLIC_URL") {
            settings.download_base = Some(public.trim_end_matches('/').to_string());
        }
        settings.api_key = ENGINE_API_KEY_VARS.iter().find_map(|key| get(*key));

        if let Some(raw) = get("ENGINE_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => settings.timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid ENGINE_TIMEOUT_SECS={}", raw),
            }
        }

        settings
    }
}

/// Top-level VidPrompt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidPromptConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Render engine connection.
    pub engine: EngineSettings,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
}

impl VidPromptConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    ///
    /// Unset variables take defaults. Set but unparsable ones are errors.
    pub fn from_lookup(
        data_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {:?}", raw)))?,
            None => DEFAULT_PORT,
        };

        let max_upload_mb = match get("MAX_UPLOAD_MB") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(mb) if mb > 0 => mb,
                _ => {
                    return Err(Error::Config(format!(
                        "MAX_UPLOAD_MB must be a positive whole number, got {:?}",
                        raw
                    )))
                }
            },
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        let max_upload_bytes = max_upload_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            Error::Config(format!("MAX_UPLOAD_MB={} is too large", max_upload_mb))
        })?;

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            engine: EngineSettings::from_lookup(&lookup),
            max_upload_bytes,
        })
    }
}
