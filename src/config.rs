//! Settings and completion backend configuration.
//!
//! Values come from the process environment first and fall back to the
//! `env` map in `$HOME/.change-narrator/settings.json`. The resulting
//! [`CompletionConfig`] is built once and handed to the client and the
//! pipeline; nothing reads the environment after that.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::ai::AiError;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable selecting the model.
pub const MODEL_VAR: &str = "OPENAI_MODEL";
/// Environment variable setting the sampling temperature.
pub const TEMPERATURE_VAR: &str = "OPENAI_TEMPERATURE";
/// Environment variable capping legacy summary length.
pub const MAX_TOKENS_VAR: &str = "OPENAI_MAX_TOKENS";
/// Environment variable with the legacy stop sequence.
pub const STOP_VAR: &str = "OPENAI_STOP";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Legacy summary token cap used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 60;
/// API base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Settings loaded from `$HOME/.change-narrator/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path; a missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(".change-narrator").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        // Process environment takes precedence over the settings file
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }
}

/// Completion backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionConfig {
    /// API key sent as a bearer token.
    #[serde(serialize_with = "redact")]
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature for every completion call.
    pub temperature: f32,
    /// Token cap for the legacy single-stage summary.
    pub max_tokens: u32,
    /// Stop sequence for the legacy single-stage summary.
    pub stop: Option<String>,
    /// API base URL, without the `/v1/...` suffix.
    pub base_url: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stop: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

fn redact<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_str("<redacted>"),
        None => serializer.serialize_none(),
    }
}

impl CompletionConfig {
    /// Builds the configuration from the environment with settings fallback.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::from_lookup(|key| settings.get_env_var(key))
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An exported-but-empty variable counts as unset
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let temperature = match non_empty(TEMPERATURE_VAR) {
            Some(raw) => parse_temperature(&raw)
                .with_context(|| format!("Invalid {TEMPERATURE_VAR} value '{raw}'"))?,
            None => defaults.temperature,
        };

        let max_tokens = match non_empty(MAX_TOKENS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid {MAX_TOKENS_VAR} value '{raw}'"))?,
            None => defaults.max_tokens,
        };

        let base_url = match non_empty(BASE_URL_VAR) {
            Some(raw) => {
                // Validate only; the original string is kept so trailing slashes survive
                Url::parse(raw.trim())
                    .with_context(|| format!("Invalid {BASE_URL_VAR} value '{raw}'"))?;
                raw.trim().to_string()
            }
            None => defaults.base_url,
        };

        Ok(Self {
            api_key: non_empty(API_KEY_VAR),
            model: non_empty(MODEL_VAR).unwrap_or(defaults.model),
            temperature,
            max_tokens,
            stop: non_empty(STOP_VAR),
            base_url,
        })
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, model: Option<String>, temperature: Option<f32>) -> Result<Self> {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(temperature) = temperature {
            check_temperature(temperature)?;
            self.temperature = temperature;
        }
        Ok(self)
    }

    /// Returns the API key or the error explaining how to set one.
    pub fn require_api_key(&self) -> std::result::Result<&str, AiError> {
        self.api_key.as_deref().ok_or(AiError::ApiKeyNotFound)
    }
}

fn parse_temperature(raw: &str) -> Result<f32> {
    let value = raw.trim().parse::<f32>()?;
    check_temperature(value)?;
    Ok(value)
}

fn check_temperature(value: f32) -> Result<()> {
    if !(0.0..=2.0).contains(&value) {
        bail!("temperature must be between 0.0 and 2.0, got {value}");
    }
    Ok(())
}
