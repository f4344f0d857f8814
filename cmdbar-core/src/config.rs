//! Configuration system for cmdbar.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/cmdbar/config.toml` and/or `.cmdbar/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::tokenizer::{DEFAULT_QUOTE, Tokenizer};

/// Top-level configuration for the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    pub tokenizer: TokenizerConfig,
    pub ui: UiConfig,
}

/// Where and how to reach the command backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/commands` is appended for both endpoints.
    pub base_url: String,
    /// HTTP client timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub quote: char,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            quote: DEFAULT_QUOTE,
        }
    }
}

impl TokenizerConfig {
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.quote)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Maximum number of candidate names shown in the help view.
    pub max_visible_candidates: usize,
    /// Whether results are echoed into the transcript pane.
    pub show_transcript: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_visible_candidates: 8,
            show_transcript: true,
        }
    }
}

impl ConsoleConfig {
    /// Reject settings the console cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "backend.base_url must not be empty".into(),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "backend.timeout_secs must be greater than zero".into(),
            });
        }
        if self.tokenizer.quote.is_whitespace() {
            return Err(ConfigError::Invalid {
                message: "tokenizer.quote must not be whitespace".into(),
            });
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CMDBAR_`)
/// 3. Workspace-local config (`.cmdbar/config.toml`)
/// 4. User config (`~/.config/cmdbar/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ConsoleConfig>,
) -> Result<ConsoleConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ConsoleConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "cmdbar", "cmdbar") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".cmdbar").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (CMDBAR_BACKEND__BASE_URL, CMDBAR_TOKENIZER__QUOTE, etc.)
    figment = figment.merge(Env::prefixed("CMDBAR_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: ConsoleConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a single explicit TOML file layered over the defaults.
pub fn load_config_file(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let config: ConsoleConfig = Figment::from(Serialized::defaults(ConsoleConfig::default()))
        .merge(Toml::file(path))
        .extract()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}
