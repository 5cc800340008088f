//! TOML-based configuration for memberhub
//!
//! Infrastructure settings (listen address, logging, database location, token
//! lifetimes, hashing cost) come from `memberhub.toml`. Secrets never live in
//! the file; it names the environment variable that holds them.

use crate::auth::{PasswordHasher, SessionPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Signing keys shorter than this are refused at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest session lifetime accepted from configuration (ten years).
pub const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// Root configuration structure loaded from memberhub.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            cors_origins: Vec::new(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    #[serde(default = "default_admin_session_ttl")]
    pub admin_session_ttl_secs: i64,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    #[serde(default)]
    pub argon2: Argon2Config,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_session_ttl() -> i64 {
    7 * 24 * 3600
}

fn default_admin_session_ttl() -> i64 {
    24 * 3600
}

fn default_min_password_length() -> usize {
    6
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            session_ttl_secs: default_session_ttl(),
            admin_session_ttl_secs: default_admin_session_ttl(),
            min_password_length: default_min_password_length(),
            argon2: Argon2Config::default(),
        }
    }
}

/// Argon2id cost. Defaults follow the argon2 crate's recommended parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/memberhub.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl HubConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: HubConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.jwt_secret()?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "JWT secret in '{}' must be at least {} bytes",
                self.auth.jwt_secret_env, MIN_JWT_SECRET_LEN
            )));
        }

        for (key, secs) in [
            ("auth.session_ttl_secs", self.auth.session_ttl_secs),
            ("auth.admin_session_ttl_secs", self.auth.admin_session_ttl_secs),
        ] {
            if secs <= 0 || secs > MAX_SESSION_TTL_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be between 1 and {}",
                    key, MAX_SESSION_TTL_SECS
                )));
            }
        }
        if self.auth.min_password_length == 0 {
            return Err(ConfigError::ValidationError(
                "auth.min_password_length must be at least 1".to_string(),
            ));
        }

        self.password_hasher()?;

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the JWT secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        std::env::var(&self.auth.jwt_secret_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            session_ttl: chrono::Duration::seconds(self.auth.session_ttl_secs),
            admin_session_ttl: chrono::Duration::seconds(self.auth.admin_session_ttl_secs),
            min_password_length: self.auth.min_password_length,
        }
    }

    pub fn password_hasher(&self) -> Result<PasswordHasher, ConfigError> {
        let a = &self.auth.argon2;
        PasswordHasher::new(a.memory_kib, a.iterations, a.parallelism)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
