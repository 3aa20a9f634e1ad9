//! Error taxonomy shared by provider calls and pipeline-level orchestration.
//!
//! `NotFound` is deliberately absent here: it is the `ChannelResult::NotFound`
//! / `VideoResult::NotFound` sum-type arm in [`crate::provider`], not an error.
//! `SchemaViolation` is likewise absent: it lives in the health/validate report
//! types as a `Severity`-tagged finding, since collectors never raise it.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("transient upstream error (status {status}): {message}")]
    TransientHttp { status: u16, message: String },

    #[error("transient network error: {0}")]
    TransientNetwork(String),

    #[error("terminal upstream error (status {status}): {message}")]
    Terminal { status: u16, message: String },

    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Classification used by the retry executor to pick a backoff schedule.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            ProviderError::TransientHttp { .. } => RetryClass::TransientHttp,
            ProviderError::TransientNetwork(_) => RetryClass::TransientNetwork,
            ProviderError::Terminal { .. } => RetryClass::Terminal,
            ProviderError::RetriesExhausted { .. } => RetryClass::Terminal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    TransientHttp,
    TransientNetwork,
    Terminal,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("checkpoint at {path} is corrupt: {source}")]
    CheckpointCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Fatal(String),
}
