//! Local media work for the Shotlist pipeline.
//!
//! This crate provides:
//! - Video blobs backed by files or memory
//! - Base64 encoding of videos for the analysis request
//! - Type-safe FFmpeg command building with timeouts
//! - Thumbnail frame capture (downscaled JPEG data URLs)

pub mod blob;
pub mod command;
pub mod encode;
pub mod error;
pub mod frame;

pub use blob::{guess_mime_type, BlobSource, OpenedVideo, VideoBlob};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use encode::encode_video;
pub use error::{MediaError, MediaResult};
pub use frame::{
    render_jpeg_data_url, scaled_dimensions, FfmpegFrameExtractor, FrameCapture,
    THUMBNAIL_JPEG_QUALITY, THUMBNAIL_MAX_DIMENSION,
};
