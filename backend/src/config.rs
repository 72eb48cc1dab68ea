// Server settings: optional TOML file, then environment overrides, then validation.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::constants::{
    DEFAULT_BIND, DEFAULT_JWT_SECRET, DEFAULT_PORT, MAX_TOKEN_TTL_DAYS, TELEMETRY_INTERVAL_MS,
};
use crate::error::ConfigError;
use crate::users::UserStoreConfig;
use rover_telemetry_core::constants::TOKEN_TTL_DAYS;

pub const CONFIG_PATH_ENV: &str = "ROVER_CONFIG";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: u64,

    /// JSON user document; `None` keeps users in memory.
    #[serde(default)]
    pub users_db: Option<PathBuf>,

    /// MongoDB connection string; takes precedence over `users_db`.
    #[serde(default)]
    pub mongo_uri: Option<String>,

    #[serde(default = "default_telemetry_interval_ms")]
    pub telemetry_interval_ms: u64,
}

fn default_bind() -> String { DEFAULT_BIND.to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_jwt_secret() -> String { DEFAULT_JWT_SECRET.to_string() }
fn default_token_ttl_days() -> u64 { TOKEN_TTL_DAYS }
fn default_telemetry_interval_ms() -> u64 { TELEMETRY_INTERVAL_MS }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            jwt_secret: default_jwt_secret(),
            token_ttl_days: default_token_ttl_days(),
            users_db: None,
            mongo_uri: None,
            telemetry_interval_ms: default_telemetry_interval_ms(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// File named by `ROVER_CONFIG` (or defaults), then process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path)?,
            _ => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_empty("HTTP_BIND") {
            self.bind = value;
        }
        if let Some(value) = non_empty("PORT") {
            self.port = value.trim().parse().map_err(|_| ConfigError::Env {
                name: "PORT",
                value: value.clone(),
            })?;
        }
        if let Some(value) = non_empty("JWT_SECRET") {
            self.jwt_secret = value;
        }
        if let Some(value) = non_empty("USERS_DB") {
            self.users_db = Some(PathBuf::from(value));
        }
        if let Some(value) = non_empty("MONGO_URI") {
            self.mongo_uri = Some(value);
        }
        if let Some(value) = non_empty("TELEMETRY_INTERVAL_MS") {
            self.telemetry_interval_ms = value.trim().parse().map_err(|_| ConfigError::Env {
                name: "TELEMETRY_INTERVAL_MS",
                value: value.clone(),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must not be empty".into()));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_days must be between 1 and {MAX_TOKEN_TTL_DAYS}"
            )));
        }
        if self.telemetry_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry_interval_ms must be greater than zero".into(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad bind address {}:{}", self.bind, self.port)))
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_days.saturating_mul(24 * 60 * 60))
    }

    pub fn user_store(&self) -> UserStoreConfig {
        match (&self.mongo_uri, &self.users_db) {
            (Some(uri), _) => UserStoreConfig::Mongo(uri.clone()),
            (None, Some(path)) => UserStoreConfig::JsonFile(path.clone()),
            (None, None) => UserStoreConfig::Memory,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn warn_on_weak_settings(&self) {
        if self.uses_default_secret() {
            warn!("JWT_SECRET not set, signing tokens with the built-in default secret");
        }
    }
}
