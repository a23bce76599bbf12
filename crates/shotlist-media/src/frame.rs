//! Thumbnail frame capture.
//!
//! A frame is decoded by FFmpeg as a lossless PNG on stdout, then downscaled
//! and re-encoded as JPEG here so the size and quality rules live in one place.

use std::io::Cursor;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageFormat};
use tracing::debug;

use crate::blob::VideoBlob;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Longest side of a captured thumbnail, in pixels.
pub const THUMBNAIL_MAX_DIMENSION: u32 = 640;
/// JPEG quality of captured thumbnails (0-100).
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;
/// Default per-capture FFmpeg timeout.
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 30;

/// Something that can grab a still from a video at a timestamp.
#[async_trait]
pub trait FrameCapture: Send + Sync {
    /// Capture the frame at `timestamp_seconds` as a `data:image/jpeg;base64,...` URL.
    async fn capture(&self, blob: &VideoBlob, timestamp_seconds: f64) -> MediaResult<String>;
}

/// Frame capture backed by the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    runner: FfmpegRunner,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_TIMEOUT_SECS)
    }
}

impl FfmpegFrameExtractor {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
        }
    }

    /// Build the FFmpeg invocation for one frame.
    ///
    /// Out-of-range timestamps are passed through; FFmpeg decides what to do.
    pub fn frame_command(input: &std::path::Path, timestamp_seconds: f64) -> FfmpegCommand {
        FfmpegCommand::to_stdout(input)
            .seek(timestamp_seconds)
            .no_audio()
            .single_frame()
            .video_codec("png")
            .format("image2pipe")
            .log_level("error")
    }
}

#[async_trait]
impl FrameCapture for FfmpegFrameExtractor {
    async fn capture(&self, blob: &VideoBlob, timestamp_seconds: f64) -> MediaResult<String> {
        // Held until the end of this scope on every path.
        let opened = blob.open().await?;

        let cmd = Self::frame_command(opened.path(), timestamp_seconds);
        let png = self.runner.output(&cmd).await?;
        if png.is_empty() {
            return Err(MediaError::capture(format!(
                "no frame decoded at {:.3}s",
                timestamp_seconds
            )));
        }

        let data_url = render_jpeg_data_url(&png)?;
        debug!(
            "Captured frame at {:.3}s from {} ({} chars)",
            timestamp_seconds,
            blob.name(),
            data_url.len()
        );
        Ok(data_url)
    }
}

/// Target size for a frame so the longer side is at most
/// [`THUMBNAIL_MAX_DIMENSION`], preserving aspect ratio. Never upscales.
///
/// Bounding the longer side means portrait frames come out narrower than a
/// fixed 640 px width would give (1080x1920 becomes 360x640).
pub fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer == 0 {
        return (0, 0);
    }
    let scale = (THUMBNAIL_MAX_DIMENSION as f64 / longer as f64).min(1.0);
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Downscale a decoded PNG frame and encode it as a JPEG data URL.
pub fn render_jpeg_data_url(png: &[u8]) -> MediaResult<String> {
    let frame = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| MediaError::capture(format!("could not decode frame: {}", e)))?;

    let (width, height) = scaled_dimensions(frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(MediaError::capture("frame has zero size"));
    }

    let frame = if (width, height) != (frame.width(), frame.height()) {
        frame.resize_exact(width, height, FilterType::Triangle)
    } else {
        frame
    };
    let rgb = frame.to_rgb8();

    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, THUMBNAIL_JPEG_QUALITY)
        .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|e| MediaError::capture(format!("could not encode jpeg: {}", e)))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(jpeg.into_inner())
    ))
}
