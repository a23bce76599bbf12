//! Thumbnail fan-out.
//!
//! A fixed number of workers drain a shared queue of `(index, timestamp)`
//! jobs. Worker `w` waits `w * stagger` before its first pick so the initial
//! burst of decodes is spread out. Each capture is bounded by a timeout and
//! a failure only affects its own slot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, warn};

use shotlist_media::{FrameCapture, VideoBlob};
use shotlist_models::{Shot, ThumbnailSlot};

use crate::metrics;

/// One capture to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureJob {
    pub index: usize,
    pub timestamp_seconds: f64,
}

impl CaptureJob {
    /// One job per shot, at the shot's start time.
    pub fn for_shots(shots: &[Shot]) -> Vec<CaptureJob> {
        shots
            .iter()
            .enumerate()
            .map(|(index, shot)| CaptureJob {
                index,
                timestamp_seconds: shot.start_time_seconds,
            })
            .collect()
    }
}

/// Outcome counts of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub captured: usize,
    pub failed: usize,
}

impl ExtractionSummary {
    pub fn settled(&self) -> usize {
        self.captured + self.failed
    }
}

/// Bounded pool of frame-capture workers.
#[derive(Clone)]
pub struct ExtractionPool {
    capture: Arc<dyn FrameCapture>,
    workers: usize,
    stagger: Duration,
    timeout: Duration,
}

impl ExtractionPool {
    pub fn new(
        capture: Arc<dyn FrameCapture>,
        workers: usize,
        stagger: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            capture,
            workers: workers.max(1),
            stagger,
            timeout,
        }
    }

    /// Run every job, reporting each settled slot through `on_settled`.
    ///
    /// Returns once all jobs have settled.
    pub async fn run<F>(&self, blob: &VideoBlob, jobs: Vec<CaptureJob>, on_settled: F) -> ExtractionSummary
    where
        F: Fn(usize, ThumbnailSlot) + Sync,
    {
        if jobs.is_empty() {
            return ExtractionSummary::default();
        }

        let workers = self.workers.min(jobs.len());
        let queue = Mutex::new(VecDeque::from(jobs));
        let summary = Mutex::new(ExtractionSummary::default());

        debug!("Starting {} capture workers", workers);

        let tasks = (0..workers).map(|worker| {
            let queue = &queue;
            let summary = &summary;
            let on_settled = &on_settled;
            async move {
                if worker > 0 {
                    tokio::time::sleep(self.stagger.saturating_mul(worker as u32)).await;
                }
                while let Some(job) = next_job(queue) {
                    let slot = self.capture_one(blob, job).await;
                    if let Ok(mut summary) = summary.lock() {
                        if slot.is_ready() {
                            summary.captured += 1;
                        } else {
                            summary.failed += 1;
                        }
                    }
                    on_settled(job.index, slot);
                }
            }
        });
        join_all(tasks).await;

        summary.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn capture_one(&self, blob: &VideoBlob, job: CaptureJob) -> ThumbnailSlot {
        let start = Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            self.capture.capture(blob, job.timestamp_seconds),
        )
        .await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(Ok(data_url)) => {
                metrics::record_capture("ready", elapsed);
                ThumbnailSlot::ready(data_url)
            }
            Ok(Err(e)) => {
                warn!(shot_index = job.index, "Failed to capture frame: {}", e);
                metrics::record_capture("failed", elapsed);
                ThumbnailSlot::failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    shot_index = job.index,
                    "Frame capture timed out after {:?}", self.timeout
                );
                metrics::record_capture("timeout", elapsed);
                ThumbnailSlot::failed(format!(
                    "capture timed out after {} ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }
}

fn next_job(queue: &Mutex<VecDeque<CaptureJob>>) -> Option<CaptureJob> {
    queue.lock().ok().and_then(|mut q| q.pop_front())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shotlist_media::{MediaError, MediaResult};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails at the given timestamps, sleeps at others, tracks concurrency.
    struct ScriptedCapture {
        fail_at: HashSet<u64>,
        hang_at: HashSet<u64>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedCapture {
        fn new() -> Self {
            Self {
                fail_at: HashSet::new(),
                hang_at: HashSet::new(),
                delay: Duration::from_millis(5),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FrameCapture for ScriptedCapture {
        async fn capture(&self, _blob: &VideoBlob, timestamp_seconds: f64) -> MediaResult<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let key = timestamp_seconds as u64;
            if self.hang_at.contains(&key) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_at.contains(&key) {
                Err(MediaError::capture("no frame produced"))
            } else {
                Ok(format!("data:image/jpeg;base64,{}", key))
            }
        }
    }

    /// Records when each timestamp's capture started, relative to `origin`.
    struct RecordingCapture {
        origin: tokio::time::Instant,
        hold: Duration,
        starts: Mutex<Vec<(u64, Duration)>>,
    }

    #[async_trait]
    impl FrameCapture for RecordingCapture {
        async fn capture(&self, _blob: &VideoBlob, timestamp_seconds: f64) -> MediaResult<String> {
            self.starts
                .lock()
                .unwrap()
                .push((timestamp_seconds as u64, self.origin.elapsed()));
            tokio::time::sleep(self.hold).await;
            Ok("data:image/jpeg;base64,".to_string())
        }
    }

    fn jobs(n: usize) -> Vec<CaptureJob> {
        (0..n)
            .map(|index| CaptureJob {
                index,
                timestamp_seconds: index as f64,
            })
            .collect()
    }

    fn blob() -> VideoBlob {
        VideoBlob::from_bytes("clip.mp4", "video/mp4", vec![0u8; 8])
    }

    fn collect_into(slots: &Mutex<Vec<Option<ThumbnailSlot>>>) -> impl Fn(usize, ThumbnailSlot) + Sync + '_ {
        move |index, slot| {
            slots.lock().unwrap()[index] = Some(slot);
        }
    }

    #[tokio::test]
    async fn test_every_job_settles() {
        let capture = Arc::new(ScriptedCapture::new());
        let pool = ExtractionPool::new(capture, 2, Duration::from_millis(1), Duration::from_secs(5));
        let slots = Mutex::new(vec![None; 5]);

        let summary = pool.run(&blob(), jobs(5), collect_into(&slots)).await;

        assert_eq!(summary, ExtractionSummary { captured: 5, failed: 0 });
        let slots = slots.into_inner().unwrap();
        assert!(slots.iter().all(|s| matches!(s, Some(ThumbnailSlot::Ready { .. }))));
        assert_eq!(
            slots[3].as_ref().and_then(|s| s.data_url()),
            Some("data:image/jpeg;base64,3")
        );
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let mut capture = ScriptedCapture::new();
        capture.fail_at.insert(1);
        let pool = ExtractionPool::new(Arc::new(capture), 4, Duration::ZERO, Duration::from_secs(5));
        let slots = Mutex::new(vec![None; 3]);

        let summary = pool.run(&blob(), jobs(3), collect_into(&slots)).await;

        assert_eq!(summary, ExtractionSummary { captured: 2, failed: 1 });
        let slots = slots.into_inner().unwrap();
        assert!(slots[0].as_ref().unwrap().is_ready());
        assert!(matches!(slots[1], Some(ThumbnailSlot::Failed { .. })));
        assert!(slots[2].as_ref().unwrap().is_ready());
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_workers() {
        let capture = Arc::new(ScriptedCapture::new());
        let pool = ExtractionPool::new(capture.clone(), 3, Duration::ZERO, Duration::from_secs(5));
        let slots = Mutex::new(vec![None; 12]);

        pool.run(&blob(), jobs(12), collect_into(&slots)).await;

        assert!(capture.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(capture.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stalled_capture_times_out() {
        let mut capture = ScriptedCapture::new();
        capture.hang_at.insert(0);
        let pool = ExtractionPool::new(Arc::new(capture), 2, Duration::ZERO, Duration::from_millis(50));
        let slots = Mutex::new(vec![None; 2]);

        let summary = pool.run(&blob(), jobs(2), collect_into(&slots)).await;

        assert_eq!(summary.settled(), 2);
        let slots = slots.into_inner().unwrap();
        match &slots[0] {
            Some(ThumbnailSlot::Failed { reason }) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
        assert!(slots[1].as_ref().unwrap().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_first_pick_is_staggered() {
        let stagger = Duration::from_millis(100);
        let capture = Arc::new(RecordingCapture {
            origin: tokio::time::Instant::now(),
            hold: Duration::from_secs(1),
            starts: Mutex::new(Vec::new()),
        });
        let pool = ExtractionPool::new(capture.clone(), 3, stagger, Duration::from_secs(5));

        let summary = pool.run(&blob(), jobs(3), |_, _| {}).await;
        assert_eq!(summary.captured, 3);

        // Each worker is still holding its first job when the next one wakes,
        // so job w is picked by worker w.
        let mut starts = capture.starts.lock().unwrap().clone();
        starts.sort_by_key(|(index, _)| *index);
        assert_eq!(starts.len(), 3);
        for (worker, (index, started)) in starts.iter().enumerate() {
            assert_eq!(*index, worker as u64);
            assert!(
                *started >= stagger * worker as u32,
                "worker {} started after {:?}",
                worker,
                started
            );
            assert!(*started < stagger * worker as u32 + Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn test_no_jobs() {
        let pool = ExtractionPool::new(Arc::new(ScriptedCapture::new()), 4, Duration::ZERO, Duration::from_secs(1));
        let summary = pool.run(&blob(), Vec::new(), |_, _| {}).await;
        assert_eq!(summary, ExtractionSummary::default());
    }

    #[test]
    fn test_jobs_for_shots_use_start_time() {
        let shots: Vec<Shot> = serde_json::from_value(serde_json::json!([
            {"startTimeSeconds": 0.0, "endTimeSeconds": 2.5, "description": "a", "shotType": "b",
             "cameraMovement": "c", "mood": "d", "imagePrompt": "e"},
            {"startTimeSeconds": 2.5, "endTimeSeconds": 6.0, "description": "a", "shotType": "b",
             "cameraMovement": "c", "mood": "d", "imagePrompt": "e"}
        ]))
        .unwrap();

        let jobs = CaptureJob::for_shots(&shots);
        assert_eq!(jobs[1], CaptureJob { index: 1, timestamp_seconds: 2.5 });
    }
}
