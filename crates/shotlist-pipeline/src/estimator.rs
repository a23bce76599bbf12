//! Simulated progress while the remote analysis runs.
//!
//! The provider reports nothing until it answers, so the bar creeps forward
//! by small random steps and stops just short of the analysis ceiling.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use shotlist_models::progress::{PROGRESS_ANALYSIS_CEILING, PROGRESS_ESTIMATE_HEADROOM};
use shotlist_models::RunId;

use crate::state::StateStore;

/// Range of a single simulated step, in percent.
pub const ESTIMATE_INCREMENT: Range<f64> = 0.2..1.7;

/// Next simulated value. Never reaches the analysis ceiling.
pub fn next_estimate(previous: f64, increment: f64) -> f64 {
    let cap = PROGRESS_ANALYSIS_CEILING - PROGRESS_ESTIMATE_HEADROOM;
    if previous >= cap {
        return previous;
    }
    (previous + increment.max(0.0)).min(cap)
}

pub fn random_increment() -> f64 {
    rand::rng().random_range(ESTIMATE_INCREMENT)
}

/// Periodic estimator task scoped to the analyzing stage of one run.
///
/// Stops on its own once the run leaves that stage; dropping the handle
/// stops it immediately.
#[derive(Debug)]
pub struct ProgressEstimator {
    handle: JoinHandle<()>,
}

impl ProgressEstimator {
    pub fn spawn(store: StateStore, run_id: RunId, tick: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !store.bump_estimate(&run_id, random_increment()) {
                    debug!(run_id = %run_id, "Progress estimator stopped");
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_estimate_adds_increment() {
        assert!((next_estimate(15.0, 1.5) - 16.5).abs() < 1e-9);
    }

    #[test]
    fn test_next_estimate_capped_below_ceiling() {
        let cap = PROGRESS_ANALYSIS_CEILING - PROGRESS_ESTIMATE_HEADROOM;
        assert_eq!(next_estimate(83.9, 1.6), cap);
        assert_eq!(next_estimate(cap, 1.0), cap);
        assert!(next_estimate(50.0, 100.0) < PROGRESS_ANALYSIS_CEILING);
    }

    #[test]
    fn test_next_estimate_never_decreases() {
        assert_eq!(next_estimate(40.0, -3.0), 40.0);
        // A value already past the cap is left alone.
        assert_eq!(next_estimate(90.0, 1.0), 90.0);
    }

    #[test]
    fn test_random_increment_in_range() {
        for _ in 0..1_000 {
            let inc = random_increment();
            assert!(ESTIMATE_INCREMENT.contains(&inc));
        }
    }

    #[tokio::test]
    async fn test_estimator_advances_while_analyzing() {
        let store = StateStore::new();
        let run_id = RunId::new();
        store.begin_run(&run_id, "clip.mp4", 10).unwrap();
        store.begin_analysis(&run_id, "model");

        let estimator = ProgressEstimator::spawn(store.clone(), run_id.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(200)).await;
        let progress = store.snapshot().progress_percent;
        drop(estimator);

        assert!(progress > 15.0);
        assert!(progress < PROGRESS_ANALYSIS_CEILING);
    }

    #[tokio::test]
    async fn test_dropped_estimator_stops() {
        let store = StateStore::new();
        let run_id = RunId::new();
        store.begin_run(&run_id, "clip.mp4", 10).unwrap();
        store.begin_analysis(&run_id, "model");

        drop(ProgressEstimator::spawn(store.clone(), run_id.clone(), Duration::from_millis(5)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.snapshot().progress_percent, 15.0);
    }

    #[tokio::test]
    async fn test_estimator_stops_when_stage_changes() {
        let store = StateStore::new();
        let run_id = RunId::new();
        store.begin_run(&run_id, "clip.mp4", 10).unwrap();
        store.begin_analysis(&run_id, "model");

        let _estimator = ProgressEstimator::spawn(store.clone(), run_id.clone(), Duration::from_millis(5));
        store.publish_shots(&run_id, Vec::new());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.snapshot().progress_percent, PROGRESS_ANALYSIS_CEILING);
    }
}
