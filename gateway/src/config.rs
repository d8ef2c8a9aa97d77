use std::num::ParseIntError;

use thiserror::Error;

use crate::backend::BackendTimeouts;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MEDICAL_RAG_URL: &str = "http://localhost:5001";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got {value:?}: {source}")]
    InvalidPort { value: String, source: ParseIntError },

    #[error("MEDICAL_RAG_URL must be an http(s) URL, got {0:?}")]
    InvalidServiceUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub medical_rag_url: String,
    pub log_level: String,
    pub timeouts: BackendTimeouts,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let medical_rag_url = lookup("MEDICAL_RAG_URL")
            .unwrap_or_else(|| DEFAULT_MEDICAL_RAG_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(medical_rag_url.starts_with("http://") || medical_rag_url.starts_with("https://")) {
            return Err(ConfigError::InvalidServiceUrl(medical_rag_url));
        }

        Ok(Config {
            port,
            medical_rag_url,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            timeouts: BackendTimeouts::default(),
        })
    }
}
