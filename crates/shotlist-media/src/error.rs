//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while encoding videos or capturing frames.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The blob's bytes could not be read.
    #[error("Failed to read video: {message}")]
    Read {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The bytes were read but cannot be turned into a payload.
    #[error("Failed to encode video: {0}")]
    Encode(String),

    /// The video resource could not be opened or decoded for capture.
    #[error("Failed to load video for frame capture: {message}")]
    Load {
        message: String,
        stderr: Option<String>,
    },

    /// The frame could not be rendered into a still image.
    #[error("Failed to capture frame: {0}")]
    Capture(String),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a read failure.
    pub fn read(message: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::Read {
            message: message.into(),
            source,
        }
    }

    /// Create an encode failure.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create a load failure.
    pub fn load(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Load {
            message: message.into(),
            stderr,
        }
    }

    /// Create a capture failure.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Whether the failure happened while opening the resource rather than rendering it.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::FfmpegNotFound | Self::FileNotFound(_) | Self::Timeout(_)
        )
    }
}
