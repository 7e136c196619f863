//! # error
//!
//! Error taxonomy for one signal cycle.
//!
//! Only [`SignalError::Configuration`] (and a failed artifact write) may stop
//! a run. Every other variant is absorbed at the stage where it happens and
//! turned into a degraded-but-valid result by the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// A required credential or setting is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Not enough bars to fill the ATR window.
    #[error("Insufficient data: need {needed} usable bars, got {available}")]
    DataInsufficient { needed: usize, available: usize },

    /// Indicators were computed but produced non-finite SL/TP levels.
    #[error("Non-finite levels computed from bar at {bar}")]
    NonFiniteLevels { bar: String },

    /// Market or calendar retrieval failed.
    #[error("Retrieval error ({stage}): {message}")]
    Retrieval { stage: &'static str, message: String },

    /// The output artifact could not be written.
    #[error("Artifact write failed: {0}")]
    Artifact(#[from] std::io::Error),
}

impl SignalError {
    pub fn retrieval(stage: &'static str, err: impl std::fmt::Display) -> Self {
        SignalError::Retrieval {
            stage,
            message: err.to_string(),
        }
    }
}

/// Anything that goes wrong in the reasoning-service call.
///
/// Always caught by the decider and resolved through the fallback path.
#[derive(Debug, Error)]
pub enum DecisionServiceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorized (HTTP {0})")]
    Unauthorized(u16),

    #[error("Rate limited")]
    RateLimited,

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response")]
    EmptyResponse,

    /// Response arrived but does not satisfy the signal schema.
    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

impl From<reqwest::Error> for DecisionServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DecisionServiceError::Timeout
        } else {
            DecisionServiceError::Transport(err.to_string())
        }
    }
}

impl DecisionServiceError {
    /// Map a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => DecisionServiceError::Unauthorized(status),
            429 => DecisionServiceError::RateLimited,
            _ => DecisionServiceError::Api { status, body },
        }
    }
}
