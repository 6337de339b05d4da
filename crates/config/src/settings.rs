//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use kisan_chat_core::{ChatMode, Language};

use crate::{ConfigError, LanguageCatalog};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Chat session behaviour
    #[serde(default)]
    pub chat: ChatConfig,

    /// Canned reply resolver
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Optional YAML language catalog replacing the built-in tables
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Language a new session starts in
    #[serde(default)]
    pub default_language: Language,

    /// Mode a new session starts in
    #[serde(default)]
    pub default_mode: ChatMode,

    /// First message of a session started in text mode
    #[serde(default = "default_initial_greeting")]
    pub initial_greeting: String,

    /// Welcome shown when switching into text mode
    #[serde(default = "default_text_greeting")]
    pub text_greeting: String,

    /// Reply substituted when resolution fails
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// Delay after stopping the microphone before submitting, so trailing
    /// final results can land
    #[serde(default = "default_mic_settle_ms")]
    pub mic_settle_ms: u64,

    /// Drop replies that resolve after a mode/language switch
    #[serde(default = "default_true")]
    pub discard_stale_replies: bool,
}

fn default_initial_greeting() -> String {
    "Hello! I am Kisan.hal's AI assistant. How can I help you with your farming questions today?"
        .to_string()
}
fn default_text_greeting() -> String {
    "Hello! How can I help you today?".to_string()
}
fn default_fallback_reply() -> String {
    "I'm sorry, I'm having trouble connecting. Please try again later.".to_string()
}
fn default_mic_settle_ms() -> u64 {
    500
}
fn default_true() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            default_mode: ChatMode::default(),
            initial_greeting: default_initial_greeting(),
            text_greeting: default_text_greeting(),
            fallback_reply: default_fallback_reply(),
            mic_settle_ms: default_mic_settle_ms(),
            discard_stale_replies: true,
        }
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Lower bound of the simulated network latency
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,

    /// Upper bound of the simulated network latency
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
}

fn default_min_latency_ms() -> u64 {
    1000
}
fn default_max_latency_ms() -> u64 {
    2000
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log format
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

const MAX_LATENCY_MS: u64 = 30_000;
const MAX_MIC_SETTLE_MS: u64 = 5_000;

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_resolver()?;
        self.validate_chat()?;
        Ok(())
    }

    fn validate_resolver(&self) -> Result<(), ConfigError> {
        let resolver = &self.resolver;

        if resolver.min_latency_ms > resolver.max_latency_ms {
            return Err(ConfigError::InvalidValue {
                field: "resolver.min_latency_ms".to_string(),
                message: format!(
                    "Must not exceed max_latency_ms ({}), got {}",
                    resolver.max_latency_ms, resolver.min_latency_ms
                ),
            });
        }

        if resolver.max_latency_ms > MAX_LATENCY_MS {
            return Err(ConfigError::InvalidValue {
                field: "resolver.max_latency_ms".to_string(),
                message: format!("Latency too high (maximum {}ms)", MAX_LATENCY_MS),
            });
        }

        Ok(())
    }

    fn validate_chat(&self) -> Result<(), ConfigError> {
        let chat = &self.chat;

        if chat.mic_settle_ms > MAX_MIC_SETTLE_MS {
            return Err(ConfigError::InvalidValue {
                field: "chat.mic_settle_ms".to_string(),
                message: format!("Settle delay too high (maximum {}ms)", MAX_MIC_SETTLE_MS),
            });
        }

        for (field, value) in [
            ("chat.initial_greeting", &chat.initial_greeting),
            ("chat.text_greeting", &chat.text_greeting),
            ("chat.fallback_reply", &chat.fallback_reply),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field.to_string()));
            }
        }

        Ok(())
    }

    /// Language catalog named by `catalog_path`, or the built-in one
    pub fn load_catalog(&self) -> Result<LanguageCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => LanguageCatalog::load(path),
            None => Ok(LanguageCatalog::builtin().clone()),
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (KISAN_CHAT prefix, `__` between sections)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder =
        builder.add_source(File::with_name(&format!("{}/default", config_dir)).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(
            File::with_name(&format!("{}/{}", config_dir, env_name)).required(false),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix("KISAN_CHAT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        language = %settings.chat.default_language,
        mode = %settings.chat.default_mode,
        "Settings loaded"
    );

    Ok(settings)
}
