//! Pipeline error types.

use thiserror::Error;

use shotlist_analysis::AnalysisError;
use shotlist_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Shown when a failure carries no message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred during analysis.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file type '{0}'. Please upload a video file.")]
    UnsupportedMediaType(String),

    #[error("File is too large ({size} bytes). The limit is {limit} bytes.")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("A run is already in progress")]
    RunInProgress,

    #[error("Run {0} was reset")]
    Cancelled(String),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("{0}")]
    Analysis(#[from] AnalysisError),
}

impl PipelineError {
    /// Rejected before the pipeline started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedMediaType(_) | PipelineError::FileTooLarge { .. }
        )
    }

    /// Message stored on the run when it fails.
    pub fn user_message(&self) -> String {
        message_or_fallback(self.to_string())
    }
}

fn message_or_fallback(message: String) -> String {
    if message.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_kinds() {
        assert!(PipelineError::UnsupportedMediaType("image/png".into()).is_validation());
        assert!(PipelineError::FileTooLarge { size: 2, limit: 1 }.is_validation());
        assert!(!PipelineError::RunInProgress.is_validation());
    }

    #[test]
    fn test_user_message_passes_through() {
        let err = PipelineError::from(AnalysisError::EmptyResponse);
        assert_eq!(err.user_message(), "No response from Gemini");
    }

    #[test]
    fn test_blank_message_falls_back() {
        assert_eq!(message_or_fallback("  ".to_string()), FALLBACK_ERROR_MESSAGE);
        assert_eq!(message_or_fallback("boom".to_string()), "boom");
    }

    #[test]
    fn test_media_error_message() {
        let err = PipelineError::from(MediaError::encode("video is empty"));
        assert_eq!(err.user_message(), "Failed to encode video: video is empty");
    }
}
