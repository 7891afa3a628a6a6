//! # rr-config
//!
//! Layered configuration for the Rusty-Rank binary.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional, not committed)
//! 4. environment variables prefixed `RUSTY_RANK__`, nested with `__`
//!    (e.g. `RUSTY_RANK__STORAGE__BACKEND=redis`), including any `.env` file

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use rr_core::EngineSettings;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "RUSTY_RANK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] rr_core::AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Never logged; may carry credentials.
    pub redis_url: SecretString,
    pub command_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: SecretString::from("redis://127.0.0.1/"),
            command_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads from `./config` and the process environment (after reading `.env`).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"), Self::environment())
    }

    /// Loads from `dir/default.toml`, `dir/local.toml`, then `env`.
    pub fn load_from(dir: &Path, env: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(env)
            .build()?;
        Self::finish(config)
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::finish(config)
    }

    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let app: AppConfig = config.try_deserialize()?;
        app.engine.validate()?;
        debug!(backend = ?app.storage.backend, engine = ?app.engine, "configuration loaded");
        Ok(app)
    }
}
