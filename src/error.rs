use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a usable price series for one symbol.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price source returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("price source error {code}: {description}")]
    Api { code: String, description: String },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("empty price series")]
    Empty,

    #[error("price series too short: {0} sample(s)")]
    TooShort(usize),

    #[error("malformed price data: {0}")]
    Malformed(String),

    #[error(transparent)]
    Detect(#[from] DetectError),
}

/// Numeric failures while computing a variation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("division by zero: first price in window is 0")]
    ZeroBasePrice,

    #[error("non-finite price in window: {0}")]
    NonFinitePrice(f64),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("channel rejected message: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be in (0, 100], got {0}")]
    InvalidThreshold(f64),

    #[error("unknown sampling interval '{0}' (expected 1m, 5m, 15m, 30m or 1h)")]
    InvalidInterval(String),

    #[error("symbol list is empty")]
    NoSymbols,

    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),

    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{0} is too large")]
    DurationOutOfRange(&'static str),

    #[error("fetch concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("notifications enabled but {0} is not set")]
    MissingCredential(&'static str),
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("notification self-test failed: {0}")]
    SelfTest(#[source] DeliveryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
