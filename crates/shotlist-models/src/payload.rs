//! Encoded video payload sent to the analysis model.

use serde::{Deserialize, Serialize};

/// Video bytes re-expressed as base64 text, plus the declared media type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedVideo {
    /// Standard-alphabet base64 of the raw bytes
    pub data: String,
    /// Declared media type (e.g. `video/mp4`)
    pub mime_type: String,
}

impl EncodedVideo {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Length of the encoded text in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}

// The payload can be tens of megabytes; keep it out of logs.
impl std::fmt::Debug for EncodedVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedVideo")
            .field("mime_type", &self.mime_type)
            .field("encoded_len", &self.data.len())
            .finish()
    }
}
