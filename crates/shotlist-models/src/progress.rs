//! Progress checkpoints for a pipeline run (percent, 0-100).

/// Set when a video is submitted.
pub const PROGRESS_SUBMITTED: f64 = 5.0;
/// Set when the encoder finishes.
pub const PROGRESS_ENCODED: f64 = 10.0;
/// Starting point of the simulated analysis progress.
pub const PROGRESS_ANALYSIS_START: f64 = 15.0;
/// Ceiling of the analysis band. The simulated estimate stays below it and
/// the real analysis result jumps straight to it.
pub const PROGRESS_ANALYSIS_CEILING: f64 = 85.0;
/// Headroom the simulated estimate keeps under the ceiling.
pub const PROGRESS_ESTIMATE_HEADROOM: f64 = 1.0;
/// Upper end of the extraction band. The last percent is reserved for completion.
pub const PROGRESS_EXTRACTION_END: f64 = 99.0;
/// Progress of a completed run.
pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Progress after `settled` of `total` captures have finished.
///
/// An empty shot list sits at the end of the band.
pub fn extraction_progress(settled: usize, total: usize) -> f64 {
    let band = PROGRESS_EXTRACTION_END - PROGRESS_ANALYSIS_CEILING;
    if total == 0 {
        return PROGRESS_EXTRACTION_END;
    }
    let fraction = settled.min(total) as f64 / total as f64;
    PROGRESS_ANALYSIS_CEILING + band * fraction
}
