//! Configuration for mindwatch-service, loaded once from the environment
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::feed::{twitter::DEFAULT_BASE_URL, TwitterConfig};

pub const DEV_JWT_SECRET: &str = "mindwatch-development-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment: {0}")]
    Env(#[from] envy::Error),

    #[error("required environment variable {0} is empty")]
    Empty(&'static str),
}

#[derive(Clone, Deserialize)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,
    pub database_name: String,
    pub twitter_bearer_token: String,
    /// ONNX sequence classification model
    pub model_path: PathBuf,
    /// Defaults to `tokenizer.json` beside the model
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    #[serde(default = "default_app_host")]
    pub app_host: String,
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Comma-separated list; `*` allows any origin
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,

    #[serde(default = "default_twitter_api_base_url")]
    pub twitter_api_base_url: String,
    #[serde(default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,
    #[serde(default = "default_feed_max_retries")]
    pub feed_max_retries: u32,
    #[serde(default = "default_true")]
    pub feed_verify_on_startup: bool,

    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8000
}

fn default_cors_allowed_origins() -> String {
    "http://localhost:8080,http://127.0.0.1:8080,http://localhost:3000,http://127.0.0.1:3000"
        .to_string()
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_jwt_expiry_hours() -> i64 {
    24
}

fn default_twitter_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_feed_timeout_secs() -> u64 {
    30
}

fn default_feed_max_retries() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_sequence_length() -> usize {
    512
}

fn default_service_name() -> String {
    "mindwatch-service".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("DATABASE_URL", self.database_url.as_str()),
            ("DATABASE_NAME", self.database_name.as_str()),
            ("TWITTER_BEARER_TOKEN", self.twitter_bearer_token.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty("MODEL_PATH"));
        }
        Ok(())
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        match &self.tokenizer_path {
            Some(path) => path.clone(),
            None => self
                .model_path
                .parent()
                .map(|dir| dir.join("tokenizer.json"))
                .unwrap_or_else(|| PathBuf::from("tokenizer.json")),
        }
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn twitter(&self) -> TwitterConfig {
        TwitterConfig {
            base_url: self.twitter_api_base_url.clone(),
            bearer_token: self.twitter_bearer_token.clone(),
            timeout: Duration::from_secs(self.feed_timeout_secs),
            max_retries: self.feed_max_retries,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_name", &self.database_name)
            .field("twitter_bearer_token", &"[REDACTED]")
            .field("model_path", &self.model_path)
            .field("tokenizer_path", &self.tokenizer_path())
            .field("bind_address", &self.bind_address())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("twitter_api_base_url", &self.twitter_api_base_url)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("feed_max_retries", &self.feed_max_retries)
            .field("feed_verify_on_startup", &self.feed_verify_on_startup)
            .field("max_sequence_length", &self.max_sequence_length)
            .field("service_name", &self.service_name)
            .field("app_env", &self.app_env)
            .finish()
    }
}
