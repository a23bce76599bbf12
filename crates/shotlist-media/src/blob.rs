//! Video blobs submitted to the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Where a blob's bytes live.
#[derive(Clone)]
pub enum BlobSource {
    /// A file on local disk.
    File(PathBuf),
    /// Bytes already in memory (e.g. received over the network).
    Memory(Arc<[u8]>),
}

impl std::fmt::Debug for BlobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// A finite binary video with a declared media type.
#[derive(Debug, Clone)]
pub struct VideoBlob {
    name: String,
    mime_type: String,
    size_bytes: u64,
    source: BlobSource,
}

impl VideoBlob {
    /// Describe a file on disk without touching it.
    pub fn file(path: impl AsRef<Path>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.as_ref();
        Self {
            name: file_name(path),
            mime_type: mime_type.into(),
            size_bytes,
            source: BlobSource::File(path.to_path_buf()),
        }
    }

    /// Open a file on disk, reading its size and guessing the media type
    /// from the extension when none is given.
    pub async fn from_path(path: impl AsRef<Path>, mime_type: Option<String>) -> MediaResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| MediaError::FileNotFound(path.to_path_buf()))?;

        let mime_type = mime_type
            .or_else(|| guess_mime_type(path).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(Self::file(path, mime_type, metadata.len()))
    }

    /// Wrap bytes already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            source: BlobSource::Memory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn source(&self) -> &BlobSource {
        &self.source
    }

    /// Read the full contents.
    pub async fn read_bytes(&self) -> MediaResult<Vec<u8>> {
        match &self.source {
            BlobSource::Memory(bytes) => Ok(bytes.to_vec()),
            BlobSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                MediaError::read(format!("could not read {}", path.display()), Some(e))
            }),
        }
    }

    /// Get a seekable on-disk handle for the blob.
    ///
    /// In-memory blobs are written to a temporary file that lives as long as
    /// the returned handle; dropping it removes the file.
    pub async fn open(&self) -> MediaResult<OpenedVideo> {
        match &self.source {
            BlobSource::File(path) => {
                if !path.exists() {
                    return Err(MediaError::FileNotFound(path.clone()));
                }
                Ok(OpenedVideo {
                    path: path.clone(),
                    _temp: None,
                })
            }
            BlobSource::Memory(bytes) => {
                let suffix = extension_for_mime(&self.mime_type)
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_default();
                let temp = tempfile::Builder::new()
                    .prefix("shotlist-")
                    .suffix(&suffix)
                    .tempfile()
                    .map_err(|e| MediaError::load(format!("could not create temp file: {}", e), None))?;
                tokio::fs::write(temp.path(), bytes)
                    .await
                    .map_err(|e| MediaError::load(format!("could not write temp file: {}", e), None))?;
                debug!("Materialized {} byte blob at {}", bytes.len(), temp.path().display());
                Ok(OpenedVideo {
                    path: temp.path().to_path_buf(),
                    _temp: Some(temp),
                })
            }
        }
    }
}

/// Seekable handle to a blob; releases any temporary file on drop.
#[derive(Debug)]
pub struct OpenedVideo {
    path: PathBuf,
    _temp: Option<NamedTempFile>,
}

impl OpenedVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Guess a `video/*` media type from a file extension.
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        _ => return None,
    })
}

fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    Some(match mime_type {
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",
        "video/3gpp" => "3gp",
        _ => return None,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
