//! Pipeline orchestrator.
//!
//! Drives one run through encode, analyze and extract, publishing a
//! snapshot after every change. Only one run is active at a time.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{warn, Instrument};

use shotlist_analysis::{RetryConfig, RetryingAnalyzer, ShotAnalyzer};
use shotlist_media::{encode_video, FrameCapture, VideoBlob};
use shotlist_models::{PipelineSnapshot, RunId};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::estimator::ProgressEstimator;
use crate::extraction::{CaptureJob, ExtractionPool};
use crate::logging::RunLogger;
use crate::metrics;
use crate::state::StateStore;
use crate::validation::validate_input;

/// Wrap `analyzer` in a retry policy for transient failures when
/// `max_retries` is non-zero.
pub fn with_retries<A>(analyzer: A, max_retries: u32) -> Arc<dyn ShotAnalyzer>
where
    A: ShotAnalyzer + 'static,
{
    if max_retries == 0 {
        Arc::new(analyzer)
    } else {
        let config = RetryConfig::new("shot analysis").with_max_retries(max_retries);
        Arc::new(RetryingAnalyzer::new(analyzer, config))
    }
}

/// Shot-analysis pipeline. Cheap to clone; clones share the same run state.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    config: PipelineConfig,
    analyzer: Arc<dyn ShotAnalyzer>,
    pool: ExtractionPool,
    store: StateStore,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        analyzer: Arc<dyn ShotAnalyzer>,
        capture: Arc<dyn FrameCapture>,
    ) -> Self {
        let pool = ExtractionPool::new(
            capture,
            config.max_concurrent_captures,
            config.capture_stagger,
            config.capture_timeout,
        );
        Self {
            inner: Arc::new(PipelineInner {
                config,
                analyzer,
                pool,
                store: StateStore::new(),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.inner.store.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.inner.store.snapshot()
    }

    /// Run to completion on the current task and return the final snapshot.
    ///
    /// Validation failures and `RunInProgress` are returned as errors and
    /// leave the state untouched. Failures inside the run are reported
    /// through the snapshot's `Error` stage instead.
    pub async fn run(&self, blob: VideoBlob) -> PipelineResult<PipelineSnapshot> {
        let run_id = self.start(&blob)?;
        self.execute(run_id, blob).await;
        Ok(self.snapshot())
    }

    /// Start a run in the background and return its id.
    pub fn submit(&self, blob: VideoBlob) -> PipelineResult<RunId> {
        let run_id = self.start(&blob)?;

        let pipeline = self.clone();
        let id = run_id.clone();
        let handle = tokio::spawn(async move { pipeline.execute(id, blob).await });

        if let Ok(mut task) = self.inner.task.lock() {
            *task = Some(handle);
        }
        Ok(run_id)
    }

    /// Cancel the active run, if any, and return to idle.
    pub fn reset(&self) {
        if let Ok(mut task) = self.inner.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
        if let Some(run_id) = self.inner.store.reset() {
            RunLogger::new(&run_id, "shot_analysis").log_warning("reset by caller");
        }
    }

    /// Error-state hint for the presentation layer.
    pub fn error_hint(&self) -> String {
        format!(
            "Try uploading a smaller video file (under {}) to prevent network timeouts.",
            shotlist_models::format_megabytes(self.inner.config.max_upload_bytes)
        )
    }

    fn start(&self, blob: &VideoBlob) -> PipelineResult<RunId> {
        validate_input(blob, &self.inner.config)?;

        let run_id = RunId::new();
        self.inner
            .store
            .begin_run(&run_id, blob.name(), blob.size_bytes())?;
        metrics::record_run_started();
        Ok(run_id)
    }

    async fn execute(&self, run_id: RunId, blob: VideoBlob) {
        let logger = RunLogger::new(&run_id, "shot_analysis");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("{} ({} bytes)", blob.name(), blob.size_bytes()));

            match self.process(&run_id, &blob, &logger).await {
                Ok(shots) => {
                    metrics::record_run_completed(shots);
                    logger.log_completion(&format!("{} shots", shots));
                }
                Err(PipelineError::Cancelled(_)) => {
                    logger.log_warning("run superseded, dropping remaining work");
                }
                Err(e) => {
                    let stage = self.inner.store.snapshot().stage;
                    metrics::record_run_failed(stage.as_str());
                    logger.log_error(&e.to_string());
                    self.inner.store.fail(&run_id, &e.user_message());
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Returns the number of shots on success.
    async fn process(
        &self,
        run_id: &RunId,
        blob: &VideoBlob,
        logger: &RunLogger,
    ) -> PipelineResult<usize> {
        let store = &self.inner.store;

        // Stage 1: encode
        let payload = encode_video(blob).await?;
        self.ensure_current(run_id)?;
        store.mark_encoded(run_id);

        // Stage 2: analyze
        let model = self.inner.analyzer.model_name().to_string();
        store.begin_analysis(run_id, &model);
        logger.log_stage("analyzing", &format!("sent to {}", model));

        let estimator = ProgressEstimator::spawn(
            store.clone(),
            run_id.clone(),
            self.inner.config.progress_tick,
        );
        let started = Instant::now();
        let analysis = self.inner.analyzer.analyze(&payload).await;
        drop(estimator);
        metrics::record_analysis_duration(started.elapsed().as_secs_f64());

        let shots = analysis?;
        self.ensure_current(run_id)?;
        let total = shots.len();
        let jobs = CaptureJob::for_shots(&shots);
        store.publish_shots(run_id, shots);
        logger.log_stage("extracting_frames", &format!("{} shots detected", total));

        // Stage 3: one thumbnail per shot
        let summary = self
            .inner
            .pool
            .run(blob, jobs, |index, slot| {
                store.settle_thumbnail(run_id, index, slot);
            })
            .await;
        if summary.failed > 0 {
            logger.log_warning(&format!(
                "{} of {} thumbnails could not be captured",
                summary.failed, total
            ));
        }

        if !self.inner.config.completion_hold.is_zero() {
            tokio::time::sleep(self.inner.config.completion_hold).await;
        }
        self.ensure_current(run_id)?;
        if !store.complete(run_id) {
            warn!(run_id = %run_id, "Run could not be completed from its current stage");
        }

        Ok(total)
    }

    fn ensure_current(&self, run_id: &RunId) -> PipelineResult<()> {
        if self.inner.store.is_current(run_id) {
            Ok(())
        } else {
            Err(PipelineError::Cancelled(run_id.to_string()))
        }
    }
}
