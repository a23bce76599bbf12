//! Pipeline configuration.

use std::time::Duration;

/// Inline-data limit of the analysis provider.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Largest accepted video, in bytes
    pub max_upload_bytes: u64,
    /// Number of frame-capture workers
    pub max_concurrent_captures: usize,
    /// Delay between the first picks of consecutive workers
    pub capture_stagger: Duration,
    /// Upper bound for a single frame capture
    pub capture_timeout: Duration,
    /// Interval of the simulated analysis progress
    pub progress_tick: Duration,
    /// Pause at 100% before the run is reported as completed
    pub completion_hold: Duration,
    /// Retries for transient analysis failures (0 disables retrying)
    pub analysis_max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_captures: 4,
            capture_stagger: Duration::from_millis(200),
            capture_timeout: Duration::from_secs(30),
            progress_tick: Duration::from_millis(400),
            completion_hold: Duration::from_millis(500),
            analysis_max_retries: 0,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_upload_bytes: std::env::var("SHOTLIST_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            max_concurrent_captures: std::env::var("SHOTLIST_MAX_CONCURRENT_CAPTURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(4),
            capture_stagger: Duration::from_millis(
                std::env::var("SHOTLIST_CAPTURE_STAGGER_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(200),
            ),
            capture_timeout: Duration::from_secs(
                std::env::var("SHOTLIST_CAPTURE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            progress_tick: Duration::from_millis(
                std::env::var("SHOTLIST_PROGRESS_TICK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|ms: &u64| *ms > 0)
                    .unwrap_or(400),
            ),
            completion_hold: Duration::from_millis(
                std::env::var("SHOTLIST_COMPLETION_HOLD_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            analysis_max_retries: std::env::var("ANALYSIS_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Set the worker count. Zero is raised to one.
    pub fn with_max_concurrent_captures(mut self, workers: usize) -> Self {
        self.max_concurrent_captures = workers.max(1);
        self
    }

    pub fn with_capture_stagger(mut self, stagger: Duration) -> Self {
        self.capture_stagger = stagger;
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.progress_tick = tick;
        self
    }

    pub fn with_completion_hold(mut self, hold: Duration) -> Self {
        self.completion_hold = hold;
        self
    }

    pub fn with_analysis_max_retries(mut self, retries: u32) -> Self {
        self.analysis_max_retries = retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.max_concurrent_captures, 4);
        assert_eq!(config.progress_tick, Duration::from_millis(400));
        assert_eq!(config.analysis_max_retries, 0);
    }

    #[test]
    fn test_zero_workers_raised() {
        let config = PipelineConfig::default().with_max_concurrent_captures(0);
        assert_eq!(config.max_concurrent_captures, 1);
    }
}
