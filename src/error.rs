//! Error type shared by config loading and the metrics writers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("http write failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("metrics backend answered with status {0}")]
    Status(u16),
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("encode point: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
