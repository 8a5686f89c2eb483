use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub profiles: ProfileSettings,
    #[serde(default)]
    pub reasoning: ReasoningSettings,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_database_url() -> String { "sqlite://swipes.db".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_acquire_timeout_secs() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSettings {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self { csv_path: default_csv_path() }
    }
}

fn default_csv_path() -> String { "data/profiles.csv".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ReasoningSettings {
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: String::new(),
            timeout_secs: default_reasoning_timeout_secs(),
        }
    }
}

/// Default outer bound on a reasoning call, in seconds
pub const DEFAULT_REASONING_TIMEOUT_SECS: u64 = 20;

fn default_reasoning_timeout_secs() -> u64 { DEFAULT_REASONING_TIMEOUT_SECS }

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSettings {
    pub stt_endpoint: Option<String>,
    pub tts_endpoint: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            stt_endpoint: None,
            tts_endpoint: None,
            api_key: String::new(),
            voice: default_voice(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

fn default_voice() -> String { "en-US-GuyNeural".to_string() }
/// Default outer bound on a transcription or synthesis call, in seconds
pub const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 30;

fn default_speech_timeout_secs() -> u64 { DEFAULT_SPEECH_TIMEOUT_SECS }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_promising_threshold")]
    pub promising_threshold: u32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            promising_threshold: default_promising_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_weight")]
    pub interests: f64,
    #[serde(default = "default_personality_weight")]
    pub personality: f64,
    #[serde(default = "default_age_weight")]
    pub age: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interests: default_interest_weight(),
            personality: default_personality_weight(),
            age: default_age_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            interests: config.interests,
            personality: config.personality,
            age: config.age,
        }
    }
}

fn default_interest_weight() -> f64 { 0.3 }
fn default_personality_weight() -> f64 { 0.5 }
fn default_age_weight() -> f64 { 0.2 }
fn default_promising_threshold() -> u32 { 50 }

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
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CUPID__)
    /// 5. The plain variables used by the deployment scripts (DATABASE_URL, AZURE_*)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CUPID__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CUPID")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_deployment_env(settings, |key| std::env::var(key).ok())?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CUPID")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Variables honoured outside the CUPID__ namespace, mapped to config keys
const DEPLOYMENT_ENV: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("PROFILES_CSV", "profiles.csv_path"),
    ("AZURE_OPENAI_ENDPOINT", "reasoning.endpoint"),
    ("AZURE_OPENAI_API_KEY", "reasoning.api_key"),
    ("AZURE_SPEECH_STT_ENDPOINT", "speech.stt_endpoint"),
    ("AZURE_SPEECH_TTS_ENDPOINT", "speech.tts_endpoint"),
    ("AZURE_SPEECH_API_KEY", "speech.api_key"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

fn apply_deployment_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in DEPLOYMENT_ENV {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.interests, 0.3);
        assert_eq!(weights.personality, 0.5);
        assert_eq!(weights.age, 0.2);
        assert_eq!(ScoringWeights::from(&weights), ScoringWeights::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database.url, "sqlite://swipes.db");
        assert_eq!(settings.scoring.promising_threshold, 50);
        assert!(settings.reasoning.endpoint.is_none());
        assert_eq!(settings.reasoning.timeout_secs, DEFAULT_REASONING_TIMEOUT_SECS);
        assert_eq!(settings.speech.timeout_secs, DEFAULT_SPEECH_TIMEOUT_SECS);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_deployment_env_overrides() {
        let base = Config::builder()
            .set_override("database.url", "sqlite://other.db")
            .unwrap()
            .build()
            .unwrap();

        let overridden = apply_deployment_env(base, |key| match key {
            "AZURE_OPENAI_ENDPOINT" => Some("https://llm.test/chat".to_string()),
            "DATABASE_URL" => Some(String::new()),
            _ => None,
        })
        .unwrap();

        let settings: Settings = overridden.try_deserialize().unwrap();
        assert_eq!(settings.reasoning.endpoint.as_deref(), Some("https://llm.test/chat"));
        assert_eq!(settings.database.url, "sqlite://other.db");
    }
}
