//! TOML-based configuration for Showcash
//!
//! Infrastructure settings live in `showcash.toml`. Every section has defaults,
//! so an empty file (or no file at all) yields a runnable development setup.
//! Key material never appears in the file: `[auth]` only names the environment
//! variables that hold it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::carrier::ArtifactCarrier;
use crate::auth::codec::TokenCodec;
use crate::auth::jwt::SignedClaimsCodec;
use crate::auth::sealed::{decode_key, SealedSessionCodec};
use crate::auth::session::SessionPolicy;
use crate::types::AppError;

/// Root configuration structure loaded from showcash.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowcashConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Origins allowed by CORS. Empty disables the CORS layer.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
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
            allowed_origins: Vec::new(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// HS512 claims in the `jwt-token` cookie
    #[default]
    Signed,
    /// AES-256-GCM sealed claims in the `showcash` cookie
    Sealed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierKind {
    #[default]
    Cookie,
    Bearer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: SessionMode,

    #[serde(default)]
    pub carrier: CarrierKind,

    /// Environment variable name containing the HMAC secret (signed mode)
    #[serde(default = "default_signing_key_env")]
    pub signing_key_env: String,

    /// Environment variable name containing the base64 AEAD key (sealed mode)
    #[serde(default = "default_sealing_key_env")]
    pub sealing_key_env: String,

    /// Environment variable with comma-separated retired keys still accepted
    /// for verification
    #[serde(default)]
    pub previous_keys_env: Option<String>,

    #[serde(default = "default_session_lifetime_secs")]
    pub session_lifetime_secs: i64,

    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: i64,

    #[serde(default = "default_cookie_lifetime_secs")]
    pub cookie_lifetime_secs: i64,

    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_signing_key_env() -> String {
    "SHOWCASH_SIGNING_KEY".to_string()
}

fn default_sealing_key_env() -> String {
    "SHOWCASH_SEALING_KEY".to_string()
}

/// Upper bound for every lifetime setting: ten years.
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Out-of-range values saturate; `validate` rejects them before they get here.
fn seconds(secs: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
}

fn default_session_lifetime_secs() -> i64 {
    900
}

fn default_grace_period_secs() -> i64 {
    1_209_600
}

fn default_cookie_lifetime_secs() -> i64 {
    2_592_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::default(),
            carrier: CarrierKind::default(),
            signing_key_env: default_signing_key_env(),
            sealing_key_env: default_sealing_key_env(),
            previous_keys_env: None,
            session_lifetime_secs: default_session_lifetime_secs(),
            grace_period_secs: default_grace_period_secs(),
            cookie_lifetime_secs: default_cookie_lifetime_secs(),
            secure_cookies: false,
        }
    }
}

impl AuthConfig {
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            issuance_lifetime: seconds(self.session_lifetime_secs),
            grace_period: seconds(self.grace_period_secs),
            cookie_lifetime: seconds(self.cookie_lifetime_secs),
        }
    }

    /// Transport for artifacts issued under `cookie_name`.
    pub fn artifact_carrier(&self, cookie_name: &'static str) -> ArtifactCarrier {
        match self.carrier {
            CarrierKind::Cookie => ArtifactCarrier::Cookie {
                name: cookie_name,
                secure: self.secure_cookies,
            },
            CarrierKind::Bearer => ArtifactCarrier::Bearer,
        }
    }

    /// Build the configured codec from key material in the process environment.
    pub fn build_codec(&self) -> Result<Arc<dyn TokenCodec>, ConfigError> {
        self.build_codec_with(|name| std::env::var(name).ok())
    }

    /// Build the configured codec, resolving environment variable names
    /// through `lookup`.
    pub fn build_codec_with<F>(&self, lookup: F) -> Result<Arc<dyn TokenCodec>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let previous: Vec<String> = self
            .previous_keys_env
            .as_deref()
            .and_then(&lookup)
            .map(|keys| {
                keys.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        match self.mode {
            SessionMode::Signed => {
                let secret = required_env(&lookup, &self.signing_key_env)?;
                let mut codec = SignedClaimsCodec::new(secret.as_bytes()).map_err(invalid_key)?;
                for key in &previous {
                    codec = codec
                        .with_verification_key(key.as_bytes())
                        .map_err(invalid_key)?;
                }
                Ok(Arc::new(codec))
            }
            SessionMode::Sealed => {
                let encoded = required_env(&lookup, &self.sealing_key_env)?;
                let mut codec = SealedSessionCodec::from_base64(&encoded).map_err(invalid_key)?;
                for key in &previous {
                    let bytes = decode_key(key).map_err(invalid_key)?;
                    codec = codec.with_previous_key(&bytes).map_err(invalid_key)?;
                }
                Ok(Arc::new(codec))
            }
        }
    }
}

fn required_env<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn invalid_key(err: AppError) -> ConfigError {
    match err {
        AppError::Configuration(msg) => ConfigError::InvalidKey(msg),
        other => ConfigError::InvalidKey(other.to_string()),
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
    "./data/showcash.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Moderation Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Words rejected in real names. Empty allows everything.
    #[serde(default)]
    pub blocked_words: Vec<String>,
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

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

impl ShowcashConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ShowcashConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;

        if auth.session_lifetime_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_lifetime_secs must be positive".to_string(),
            ));
        }
        if auth.grace_period_secs < 0 {
            return Err(ConfigError::ValidationError(
                "auth.grace_period_secs must not be negative".to_string(),
            ));
        }
        for (key, value) in [
            ("session_lifetime_secs", auth.session_lifetime_secs),
            ("grace_period_secs", auth.grace_period_secs),
            ("cookie_lifetime_secs", auth.cookie_lifetime_secs),
        ] {
            if value > MAX_LIFETIME_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "auth.{} must not exceed {} seconds",
                    key, MAX_LIFETIME_SECS
                )));
            }
        }
        if auth.cookie_lifetime_secs < auth.session_lifetime_secs {
            return Err(ConfigError::ValidationError(
                "auth.cookie_lifetime_secs must be at least the session lifetime".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
