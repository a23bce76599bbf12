//! Input checks applied before a run starts.

use shotlist_media::VideoBlob;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Accept only `video/*` blobs within the upload limit.
pub fn validate_input(blob: &VideoBlob, config: &PipelineConfig) -> PipelineResult<()> {
    let mime_type = blob.mime_type().trim();
    if !mime_type.to_ascii_lowercase().starts_with("video/") {
        return Err(PipelineError::UnsupportedMediaType(mime_type.to_string()));
    }

    if blob.size_bytes() > config.max_upload_bytes {
        return Err(PipelineError::FileTooLarge {
            size: blob.size_bytes(),
            limit: config.max_upload_bytes,
        });
    }

    Ok(())
}
