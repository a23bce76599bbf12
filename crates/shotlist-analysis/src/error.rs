//! Analysis client error types.

use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No response from Gemini")]
    EmptyResponse,

    #[error("Response does not match the shot schema: {0}")]
    SchemaViolation(String),

    #[error("Gemini request failed: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },

    #[error("Gemini request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    pub fn remote(msg: impl Into<String>, status: Option<u16>) -> Self {
        Self::Remote {
            message: msg.into(),
            status,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether another attempt could succeed.
    ///
    /// Transport failures, throttling, server errors and timeouts are
    /// retryable; client errors and bad responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Timeout(_) => true,
            AnalysisError::Remote { status: None, .. } => true,
            AnalysisError::Remote {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}
