// src/error.rs

use std::time::Duration;
use thiserror::Error;

/// Failures while obtaining the raw CSV body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("fetch task aborted: {0}")]
    Aborted(String),
}

/// Failures while turning a body into a tentative snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("empty CSV payload")]
    EmptyPayload,
    #[error("could not find amount column in headers {headers:?}")]
    Schema { headers: Vec<String> },
}

/// Everything that can make a single fetch attempt fail. The orchestrator
/// handles every variant the same way: keep the accepted snapshot, count
/// the failure, back off.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AttemptError {
    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Fetch(FetchError::Timeout(_)) => "timeout",
            AttemptError::Fetch(_) => "transport",
            AttemptError::Pipeline(PipelineError::EmptyPayload) => "empty_payload",
            AttemptError::Pipeline(PipelineError::Schema { .. }) => "schema",
        }
    }
}
