use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::core::{PreFilterOptions, SelectionPenalties, TieBreak};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub reasoning: ReasoningSettings,
    pub notifier: NotifierSettings,
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReasoningSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reasoning_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ReasoningSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    #[serde(default = "default_notifier_url")]
    pub base_url: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl NotifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Coarse pre-filter band; 0 disables it
    #[serde(default = "default_age_band")]
    pub age_band: u8,
    #[serde(default)]
    pub location_prefilter: bool,
    #[serde(default = "default_age_spread")]
    pub age_spread: u8,
    #[serde(default)]
    pub tie_break: TieBreak,
    #[serde(default = "default_profession_penalty")]
    pub profession_penalty: u32,
    #[serde(default = "default_education_penalty")]
    pub education_penalty: u32,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            age_band: default_age_band(),
            location_prefilter: false,
            age_spread: default_age_spread(),
            tie_break: TieBreak::default(),
            profession_penalty: default_profession_penalty(),
            education_penalty: default_education_penalty(),
        }
    }
}

impl MatchingSettings {
    pub fn prefilter_options(&self) -> PreFilterOptions {
        PreFilterOptions {
            age_band: (self.age_band > 0).then_some(self.age_band),
            location_when_unstated: self.location_prefilter,
        }
    }

    pub fn penalties(&self) -> SelectionPenalties {
        SelectionPenalties {
            profession_mismatch: self.profession_penalty,
            education_mismatch: self.education_penalty,
        }
    }
}

fn default_true() -> bool { true }
fn default_reasoning_url() -> String { "https://generativelanguage.googleapis.com/v1beta/openai".to_string() }
fn default_model() -> String { "gemini-2.0-flash".to_string() }
fn default_notifier_url() -> String { "https://api.ultramsg.com".to_string() }
fn default_country_code() -> String { "92".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_age_band() -> u8 { 4 }
fn default_age_spread() -> u8 { 3 }
fn default_profession_penalty() -> u32 { 2 }
fn default_education_penalty() -> u32 { 1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RISHTA_)
    /// 5. The bare OPENAI_KEY, TOKEN and INSTANCE variables
    pub fn load() -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RISHTA__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RISHTA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_legacy_env(settings)?;

        Ok(settings.try_deserialize()?)
    }

    /// Fail fast when a credential the engine needs is absent
    pub fn ensure_credentials(&self) -> Result<(), SettingsError> {
        if self.notifier.token.trim().is_empty() {
            return Err(SettingsError::MissingCredential("notifier.token"));
        }
        if self.notifier.instance.trim().is_empty() {
            return Err(SettingsError::MissingCredential("notifier.instance"));
        }
        if self.reasoning.enabled && self.reasoning.api_key.trim().is_empty() {
            return Err(SettingsError::MissingCredential("reasoning.api_key"));
        }
        Ok(())
    }
}

/// Map the environment variable names used by earlier deployments onto settings
fn apply_legacy_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("OPENAI_KEY", "reasoning.api_key"),
        ("TOKEN", "notifier.token"),
        ("INSTANCE", "notifier.instance"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
