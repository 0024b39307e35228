use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Crawl failed: {0}")]
    Crawl(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PulseError>;

impl From<crate::config::ConfigError> for PulseError {
    fn from(e: crate::config::ConfigError) -> Self {
        PulseError::Config(e.to_string())
    }
}
