//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Call lifecycle policy
    #[serde(default)]
    pub call: CallPolicyConfig,

    /// Groq backend configuration (STT + LLM)
    #[serde(default)]
    pub groq: GroqConfig,

    /// Telephony provider configuration
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Supplier search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Persistence configuration
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call.max_duration_secs < 30 {
            return Err(ConfigError::InvalidValue {
                field: "call.max_duration_secs".to_string(),
                message: "Call duration cap too low (minimum 30s)".to_string(),
            });
        }

        if self.call.max_supplier_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "call.max_supplier_turns".to_string(),
                message: "Turn cap must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.groq.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "groq.temperature".to_string(),
                message: "Temperature must be within 0.0..=2.0".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL used in webhook callbacks
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Call lifecycle policy
///
/// The duration cap, turn cap and retention window are configuration rather
/// than constants so deployments can tune them per provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPolicyConfig {
    /// Hard wall-clock cap per call in seconds
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,

    /// Maximum supplier turns before extraction is forced
    #[serde(default = "default_max_supplier_turns")]
    pub max_supplier_turns: u32,

    /// How long terminal sessions stay registered for late duplicate webhooks
    #[serde(default = "default_terminal_retention")]
    pub terminal_retention_secs: u64,

    /// Maximum length of a single supplier recording in seconds
    #[serde(default = "default_recording_max")]
    pub recording_max_secs: u32,
}

fn default_max_duration() -> u64 {
    300 // 5 minutes
}
fn default_max_supplier_turns() -> u32 {
    12
}
fn default_terminal_retention() -> u64 {
    120
}
fn default_recording_max() -> u32 {
    30
}

impl Default for CallPolicyConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            max_supplier_turns: default_max_supplier_turns(),
            terminal_retention_secs: default_terminal_retention(),
            recording_max_secs: default_recording_max(),
        }
    }
}

/// Groq backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// API key (set via SUPPLIER_VOICE__GROQ__API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,

    /// Speech-to-text model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Chat model used for dialogue and extraction
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for dialogue turns
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for spoken replies; kept small for phone calls
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,

    /// Token budget for extraction output
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_groq_timeout")]
    pub timeout_secs: u64,
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_stt_model() -> String {
    "whisper-large-v3".to_string()
}
fn default_chat_model() -> String {
    "llama3-8b-8192".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_reply_max_tokens() -> u32 {
    150
}
fn default_extraction_max_tokens() -> u32 {
    500
}
fn default_groq_timeout() -> u64 {
    30
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_groq_base_url(),
            stt_model: default_stt_model(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            reply_max_tokens: default_reply_max_tokens(),
            extraction_max_tokens: default_extraction_max_tokens(),
            timeout_secs: default_groq_timeout(),
        }
    }
}

/// Telephony provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    /// Provider account SID (set via SUPPLIER_VOICE__TELEPHONY__ACCOUNT_SID)
    #[serde(default)]
    pub account_sid: String,

    /// Provider auth token
    #[serde(default)]
    pub auth_token: String,

    /// Caller phone number in E.164 format
    #[serde(default)]
    pub from_number: String,

    /// Provider API base URL
    #[serde(default = "default_telephony_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_telephony_timeout")]
    pub timeout_secs: u64,
}

fn default_telephony_base_url() -> String {
    "https://api.twilio.com".to_string()
}
fn default_telephony_timeout() -> u64 {
    15
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            base_url: default_telephony_base_url(),
            timeout_secs: default_telephony_timeout(),
        }
    }
}

/// Supplier search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SERP API key
    #[serde(default)]
    pub serp_api_key: String,

    /// SERP API base URL
    #[serde(default = "default_serp_base_url")]
    pub base_url: String,

    /// Default market country code
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Default result language
    #[serde(default = "default_language")]
    pub language: String,

    /// Maximum organic results per query
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_serp_base_url() -> String {
    "https://serpapi.com/search.json".to_string()
}
fn default_country_code() -> String {
    "kz".to_string()
}
fn default_language() -> String {
    "ru".to_string()
}
fn default_max_results() -> u32 {
    10
}
fn default_search_timeout() -> u64 {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serp_api_key: String::new(),
            base_url: default_serp_base_url(),
            country_code: default_country_code(),
            language: default_language(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable the ScyllaDB store; the service runs without one
    #[serde(default)]
    pub enabled: bool,

    /// Cluster contact points
    #[serde(default = "default_scylla_hosts")]
    pub hosts: Vec<String>,

    /// Keyspace name
    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Replication factor for the keyspace
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}
fn default_keyspace() -> String {
    "supplier_voice".to_string()
}
fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hosts: default_scylla_hosts(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
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

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (SUPPLIER_VOICE prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SUPPLIER_VOICE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.call.max_duration_secs, 300);
        assert_eq!(settings.groq.stt_model, "whisper-large-v3");
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.call.max_duration_secs = 10; // Too low
        assert!(settings.validate().is_err());

        settings.call.max_duration_secs = 120;
        assert!(settings.validate().is_ok());

        settings.call.max_supplier_turns = 0;
        assert!(settings.validate().is_err());
    }
}
