//! Workspace configuration.
//!
//! Loaded from `~/.config/kiln/config.toml` when present; every field
//! has a default so a missing or partial file is never an error. The
//! persistence format of richer user preferences (themes, fonts) is
//! out of scope; this covers only what the engine itself consumes.

use crate::assist::{DEFAULT_ANALYSIS_TIMEOUT, DEFAULT_COMPLETION_TIMEOUT};
use crate::autosave::DEFAULT_QUIET_PERIOD;
use crate::chat::{DEFAULT_CHAT_TIMEOUT, DEFAULT_MODEL};
use crate::error::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the sidecar backend service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL the HTTP collaborators are reached at.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Quiet period after the last edit before a save fires.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Natural language the assistant should answer in.
    #[serde(default = "default_answer_language")]
    pub answer_language: String,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            answer_language: default_answer_language(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            completion_timeout_secs: default_completion_timeout_secs(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

/// Engine-facing configuration, all fields optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub assist: AssistConfig,
}

impl WorkspaceConfig {
    /// Loads the configuration file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// `Io` when the file exists but cannot be read,
    /// `InvalidArgument` when it cannot be parsed.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    /// Loads a configuration file from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|err| {
            KilnError::io(format!(
                "failed to read configuration at {}: {err}",
                path.display()
            ))
        })?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the configuration, logging and swallowing failures.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Returns the path to the configuration file: `~/.config/kiln/config.toml`.
    fn config_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".config").join("kiln").join("config.toml"))
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave.quiet_period_ms)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat.timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.assist.completion_timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.assist.analysis_timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_quiet_period_ms() -> u64 {
    DEFAULT_QUIET_PERIOD.as_millis() as u64
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_answer_language() -> String {
    "english".to_string()
}

fn default_chat_timeout_secs() -> u64 {
    DEFAULT_CHAT_TIMEOUT.as_secs()
}

fn default_completion_timeout_secs() -> u64 {
    DEFAULT_COMPLETION_TIMEOUT.as_secs()
}

fn default_analysis_timeout_secs() -> u64 {
    DEFAULT_ANALYSIS_TIMEOUT.as_secs()
}
