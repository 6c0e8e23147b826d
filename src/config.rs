use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::clients::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_MS};

/// File name of the key-value store under the platform config directory
const STORAGE_FILE_NAME: &str = "storage.json";
const APP_DIR_NAME: &str = "smartcity-advisor";
const DEFAULT_LOG_LEVEL: &str = "smartcity_advisor=info";

/// Main configuration structure loaded from smartcity_advisor.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Generative endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Where the persisted key-value store (and thus the credential) lives
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Explicit path, else `<config dir>/smartcity-advisor/storage.json`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(STORAGE_FILE_NAME))
        })
    }
}

/// Optional TOML file replacing the built-in canned recommendations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses ADVISOR_CONFIG environment variable or defaults to "smartcity_advisor.toml"
    ///
    /// Call after the tracing subscriber is installed, or the missing-file
    /// warning is lost.
    pub fn load() -> anyhow::Result<Self> {
        load_env_files();

        let config_path = std::env::var("ADVISOR_CONFIG")
            .unwrap_or_else(|_| "smartcity_advisor.toml".to_string());

        let mut config = Self::load_from_path(Path::new(&config_path))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse the TOML file at `path`. A missing file yields the defaults;
    /// any other read failure is an error.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                Err(anyhow::Error::new(e).context(format!("reading config file {}", path.display())))
            }
        }
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ADVISOR_*` overrides (env-first) using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("ADVISOR_GEMINI_BASE_URL") {
            self.gemini.base_url = base_url;
            tracing::debug!("ADVISOR_GEMINI_BASE_URL env override applied");
        }
        if let Some(model) = lookup("ADVISOR_GEMINI_MODEL") {
            self.gemini.model = model;
            tracing::debug!("ADVISOR_GEMINI_MODEL env override applied");
        }
        if let Some(timeout) = lookup("ADVISOR_GEMINI_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.gemini.timeout_ms = timeout;
        }
        if let Some(path) = lookup("ADVISOR_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("ADVISOR_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gemini.model.trim().is_empty() {
            anyhow::bail!("gemini.model must not be empty");
        }
        if !self.gemini.base_url.starts_with("https://")
            && !self.gemini.base_url.starts_with("http://")
        {
            anyhow::bail!(
                "gemini.base_url '{}' must start with http:// or https://",
                self.gemini.base_url
            );
        }
        if self.gemini.timeout_ms == 0 {
            anyhow::bail!("gemini.timeout_ms must be > 0");
        }
        if self.gemini.base_url.starts_with("http://") {
            tracing::warn!(
                "gemini.base_url '{}' is not TLS; the credential is sent as a query parameter",
                self.gemini.base_url
            );
        }
        Ok(())
    }
}

/// Load `ADVISOR_ENV_FILE` if set, otherwise `./.env`. Variables already
/// present in the environment are kept, so calling this twice is harmless.
pub fn load_env_files() {
    if let Ok(env_path) = std::env::var("ADVISOR_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else {
        let _ = dotenvy::from_path(".env");
    }
}
