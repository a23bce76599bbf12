//! Video encoding for transmission to the analysis model.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use shotlist_models::EncodedVideo;

use crate::blob::VideoBlob;
use crate::error::{MediaError, MediaResult};

/// Read a blob and re-express its bytes as base64 text.
///
/// Single attempt; the caller owns any retry policy.
pub async fn encode_video(blob: &VideoBlob) -> MediaResult<EncodedVideo> {
    let bytes = blob.read_bytes().await?;
    if bytes.is_empty() {
        return Err(MediaError::encode(format!("{} is empty", blob.name())));
    }

    let data = STANDARD.encode(&bytes);
    debug!(
        "Encoded {} ({} bytes -> {} base64 chars)",
        blob.name(),
        bytes.len(),
        data.len()
    );

    Ok(EncodedVideo::new(data, blob.mime_type()))
}
