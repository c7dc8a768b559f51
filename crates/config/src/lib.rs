//! Configuration for the supplier inquiry voice agent
//!
//! Settings are loaded from `config/default`, an optional environment
//! specific file, and `SUPPLIER_VOICE__`-prefixed environment variables.

pub mod settings;

pub use settings::{
    load_settings, CallPolicyConfig, GroqConfig, ObservabilityConfig, PersistenceConfig,
    SearchConfig, ServerConfig, Settings, TelephonyConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
