//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_STARTED_TOTAL: &str = "shotlist_runs_started_total";
    pub const RUNS_COMPLETED_TOTAL: &str = "shotlist_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "shotlist_runs_failed_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "shotlist_analysis_duration_seconds";
    pub const SHOTS_DETECTED_TOTAL: &str = "shotlist_shots_detected_total";
    pub const CAPTURES_TOTAL: &str = "shotlist_frame_captures_total";
    pub const CAPTURE_DURATION_SECONDS: &str = "shotlist_frame_capture_duration_seconds";
}

pub fn record_run_started() {
    counter!(names::RUNS_STARTED_TOTAL).increment(1);
}

pub fn record_run_completed(shots: usize) {
    counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
    counter!(names::SHOTS_DETECTED_TOTAL).increment(shots as u64);
}

/// Record a failed run, labelled by the stage it failed in.
pub fn record_run_failed(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_analysis_duration(duration_secs: f64) {
    histogram!(names::ANALYSIS_DURATION_SECONDS).record(duration_secs);
}

/// Record one settled capture with outcome `ready`, `failed` or `timeout`.
pub fn record_capture(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CAPTURES_TOTAL, &labels).increment(1);
    histogram!(names::CAPTURE_DURATION_SECONDS).record(duration_secs);
}
