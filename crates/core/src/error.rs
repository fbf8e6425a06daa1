use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when the catalog cannot be reached or answers with a non-success status.
pub const GENERIC_FETCH_ERROR: &str = "Error Fetching Movies";

/// Message shown when the catalog flags a failure without saying why.
pub const FALLBACK_FETCH_ERROR: &str = "Failed to fetch Movies";

#[derive(Error, Debug)]
pub enum CinefindError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing configuration: {env_var} environment variable is not set")]
    MissingConfig { env_var: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Popularity counter rejected {operation}: {reason}")]
    CounterRejected {
        operation: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, CinefindError>;
