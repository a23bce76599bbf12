//! Run state owned by the orchestrator.
//!
//! The current [`PipelineSnapshot`] lives inside a `watch` channel and every
//! change is applied in place, so subscribers only ever observe whole
//! snapshots. All writes name the run they belong to; a write for any other
//! run is dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use shotlist_models::progress::{
    extraction_progress, PROGRESS_ANALYSIS_CEILING, PROGRESS_ANALYSIS_START, PROGRESS_COMPLETE,
    PROGRESS_ENCODED, PROGRESS_EXTRACTION_END, PROGRESS_SUBMITTED,
};
use shotlist_models::{PipelineSnapshot, PipelineStage, RunId, Shot, ThumbnailSlot};

use crate::error::{PipelineError, PipelineResult};
use crate::estimator::next_estimate;

pub const LABEL_READING: &str = "Reading video file...";
pub const LABEL_COMPLETE: &str = "Analysis Complete!";
pub const LABEL_FAILED: &str = "Analysis Failed";

pub fn analyzing_label(model: &str) -> String {
    format!("{} is analyzing scenes...", model)
}

pub fn processing_label(total: usize) -> String {
    format!("Processing {} scenes...", total)
}

pub fn extracting_label(settled: usize, total: usize) -> String {
    format!("Extracting keyframe {}/{}...", settled, total)
}

/// Shared handle to the run state.
#[derive(Debug, Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<PipelineSnapshot>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PipelineSnapshot::idle());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.tx.borrow().clone()
    }

    /// Whether `run_id` is the run currently held.
    pub fn is_current(&self, run_id: &RunId) -> bool {
        self.tx.borrow().run_id.as_ref() == Some(run_id)
    }

    /// Start a new run, discarding a finished one.
    ///
    /// Fails with `RunInProgress` while another run is active.
    pub fn begin_run(
        &self,
        run_id: &RunId,
        source_name: &str,
        source_size_bytes: u64,
    ) -> PipelineResult<()> {
        let mut started = false;
        self.tx.send_if_modified(|snap| {
            if snap.stage.is_active() {
                return false;
            }
            let seq = snap.seq;
            *snap = PipelineSnapshot::idle();
            snap.seq = seq;
            snap.run_id = Some(run_id.clone());
            snap.source_name = Some(source_name.to_string());
            snap.source_size_bytes = Some(source_size_bytes);
            enter_stage(snap, PipelineStage::ProcessingVideo, LABEL_READING);
            raise_progress(snap, PROGRESS_SUBMITTED);
            touch(snap);
            started = true;
            true
        });

        if started {
            Ok(())
        } else {
            Err(PipelineError::RunInProgress)
        }
    }

    /// Encoder finished.
    pub fn mark_encoded(&self, run_id: &RunId) -> bool {
        self.update(run_id, |snap| {
            if snap.stage != PipelineStage::ProcessingVideo {
                return false;
            }
            raise_progress(snap, PROGRESS_ENCODED);
            true
        })
    }

    /// Remote analysis started.
    pub fn begin_analysis(&self, run_id: &RunId, model: &str) -> bool {
        self.update(run_id, |snap| {
            if !snap.stage.can_transition_to(PipelineStage::Analyzing) {
                return false;
            }
            enter_stage(snap, PipelineStage::Analyzing, &analyzing_label(model));
            raise_progress(snap, PROGRESS_ANALYSIS_START);
            true
        })
    }

    /// Advance the simulated analysis progress by `increment`.
    ///
    /// Returns false once the run has left the analyzing stage.
    pub fn bump_estimate(&self, run_id: &RunId, increment: f64) -> bool {
        let mut analyzing = false;
        self.update(run_id, |snap| {
            if snap.stage != PipelineStage::Analyzing {
                return false;
            }
            analyzing = true;
            let next = next_estimate(snap.progress_percent, increment);
            if next <= snap.progress_percent {
                return false;
            }
            snap.progress_percent = next;
            true
        });
        analyzing
    }

    /// Analysis succeeded: the shots become visible with every thumbnail pending.
    pub fn publish_shots(&self, run_id: &RunId, shots: Vec<Shot>) -> bool {
        self.update(run_id, |snap| {
            if !snap.stage.can_transition_to(PipelineStage::ExtractingFrames) {
                return false;
            }
            let total = shots.len();
            enter_stage(snap, PipelineStage::ExtractingFrames, &processing_label(total));
            snap.thumbnails = Some(vec![ThumbnailSlot::Pending; total]);
            snap.shots = Some(shots);
            raise_progress(snap, PROGRESS_ANALYSIS_CEILING);
            true
        })
    }

    /// Record the outcome of one capture.
    ///
    /// A slot settles once; later writes for the same index are dropped.
    /// Only successful captures update the stage label.
    pub fn settle_thumbnail(&self, run_id: &RunId, index: usize, slot: ThumbnailSlot) -> bool {
        if !slot.is_settled() {
            return false;
        }
        let ready = slot.is_ready();
        self.update(run_id, |snap| {
            if snap.stage != PipelineStage::ExtractingFrames {
                return false;
            }
            let Some(slots) = snap.thumbnails.as_mut() else {
                return false;
            };
            match slots.get_mut(index) {
                Some(current) if !current.is_settled() => *current = slot,
                _ => return false,
            }
            let total = slots.len();
            let settled = slots.iter().filter(|s| s.is_settled()).count();
            if ready {
                snap.current_stage_label = extracting_label(settled, total);
            }
            raise_progress(snap, extraction_progress(settled, total));
            true
        })
    }

    /// All captures settled.
    pub fn complete(&self, run_id: &RunId) -> bool {
        self.update(run_id, |snap| {
            if !snap.stage.can_transition_to(PipelineStage::Completed) {
                return false;
            }
            enter_stage(snap, PipelineStage::Completed, LABEL_COMPLETE);
            snap.progress_percent = PROGRESS_COMPLETE;
            true
        })
    }

    /// Encoder or analysis failed. Shots obtained so far are kept.
    pub fn fail(&self, run_id: &RunId, message: &str) -> bool {
        self.update(run_id, |snap| {
            if !snap.stage.can_transition_to(PipelineStage::Error) {
                return false;
            }
            enter_stage(snap, PipelineStage::Error, LABEL_FAILED);
            snap.error_message = Some(message.to_string());
            true
        })
    }

    /// Discard the current run and return to idle.
    pub fn reset(&self) -> Option<RunId> {
        let mut previous = None;
        self.tx.send_modify(|snap| {
            previous = snap.run_id.take();
            let seq = snap.seq;
            *snap = PipelineSnapshot::idle();
            snap.seq = seq;
            touch(snap);
        });
        previous
    }

    /// Apply a fenced change; `apply` returns whether it changed anything.
    fn update<F>(&self, run_id: &RunId, apply: F) -> bool
    where
        F: FnOnce(&mut PipelineSnapshot) -> bool,
    {
        self.tx.send_if_modified(|snap| {
            if snap.run_id.as_ref() != Some(run_id) {
                return false;
            }
            if !apply(snap) {
                return false;
            }
            touch(snap);
            true
        })
    }
}

fn enter_stage(snap: &mut PipelineSnapshot, stage: PipelineStage, label: &str) {
    snap.stage = stage;
    snap.step_label = stage.step_label().to_string();
    snap.current_stage_label = label.to_string();
}

/// Progress never moves backwards and only completion reaches 100.
fn raise_progress(snap: &mut PipelineSnapshot, value: f64) {
    let value = value.clamp(0.0, PROGRESS_EXTRACTION_END);
    if value > snap.progress_percent {
        snap.progress_percent = value;
    }
}

fn touch(snap: &mut PipelineSnapshot) {
    snap.seq += 1;
    snap.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(start: f64) -> Shot {
        serde_json::from_value(serde_json::json!({
            "startTimeSeconds": start,
            "endTimeSeconds": start + 2.0,
            "description": "Street at night",
            "shotType": "Wide Shot",
            "cameraMovement": "Dolly In",
            "mood": "Noir",
            "imagePrompt": "Rain-slick street at night, neon reflections, slow dolly in"
        }))
        .unwrap()
    }

    fn started(store: &StateStore) -> RunId {
        let run_id = RunId::new();
        store.begin_run(&run_id, "clip.mp4", 1_024).unwrap();
        run_id
    }

    #[test]
    fn test_begin_run() {
        let store = StateStore::new();
        let run_id = started(&store);

        let snap = store.snapshot();
        assert_eq!(snap.stage, PipelineStage::ProcessingVideo);
        assert_eq!(snap.progress_percent, PROGRESS_SUBMITTED);
        assert_eq!(snap.step_label, "Step 1 of 3");
        assert_eq!(snap.current_stage_label, LABEL_READING);
        assert_eq!(snap.run_id, Some(run_id));
        assert!(snap.shots.is_none());
        assert!(snap.thumbnails.is_none());
    }

    #[test]
    fn test_second_run_rejected_while_active() {
        let store = StateStore::new();
        let first = started(&store);

        let err = store.begin_run(&RunId::new(), "other.mp4", 1).unwrap_err();
        assert!(matches!(err, PipelineError::RunInProgress));
        assert!(store.is_current(&first));
    }

    #[test]
    fn test_full_lifecycle() {
        let store = StateStore::new();
        let run_id = started(&store);

        assert!(store.mark_encoded(&run_id));
        assert!(store.begin_analysis(&run_id, "gemini-test"));
        assert_eq!(store.snapshot().current_stage_label, "gemini-test is analyzing scenes...");
        assert!(store.publish_shots(&run_id, vec![shot(0.0), shot(2.0)]));

        let snap = store.snapshot();
        assert_eq!(snap.stage, PipelineStage::ExtractingFrames);
        assert_eq!(snap.progress_percent, PROGRESS_ANALYSIS_CEILING);
        assert_eq!(snap.current_stage_label, "Processing 2 scenes...");
        assert_eq!(snap.settled_thumbnails(), 0);

        assert!(store.settle_thumbnail(&run_id, 1, ThumbnailSlot::ready("data:image/jpeg;base64,AA")));
        assert_eq!(store.snapshot().current_stage_label, "Extracting keyframe 1/2...");
        assert!(store.settle_thumbnail(&run_id, 0, ThumbnailSlot::failed("boom")));

        let snap = store.snapshot();
        assert_eq!(snap.progress_percent, PROGRESS_EXTRACTION_END);
        assert_eq!(snap.stage, PipelineStage::ExtractingFrames);

        assert!(store.complete(&run_id));
        let snap = store.snapshot();
        assert_eq!(snap.stage, PipelineStage::Completed);
        assert_eq!(snap.progress_percent, PROGRESS_COMPLETE);
        assert_eq!(snap.current_stage_label, LABEL_COMPLETE);
        assert_eq!(snap.step_label, "");
    }

    #[test]
    fn test_slot_settles_once() {
        let store = StateStore::new();
        let run_id = started(&store);
        store.begin_analysis(&run_id, "m");
        store.publish_shots(&run_id, vec![shot(0.0)]);

        assert!(store.settle_thumbnail(&run_id, 0, ThumbnailSlot::failed("first")));
        assert!(!store.settle_thumbnail(&run_id, 0, ThumbnailSlot::ready("late")));
        assert!(!store.settle_thumbnail(&run_id, 5, ThumbnailSlot::ready("out of range")));
        assert_eq!(store.snapshot().thumbnail(0), None);
    }

    #[test]
    fn test_stale_run_writes_dropped() {
        let store = StateStore::new();
        let stale = started(&store);
        store.reset();
        let fresh = started(&store);

        assert!(!store.begin_analysis(&stale, "m"));
        assert!(!store.fail(&stale, "late failure"));

        let snap = store.snapshot();
        assert_eq!(snap.run_id, Some(fresh));
        assert_eq!(snap.stage, PipelineStage::ProcessingVideo);
        assert!(snap.error_message.is_none());
    }

    #[test]
    fn test_estimate_stays_below_ceiling() {
        let store = StateStore::new();
        let run_id = started(&store);
        store.begin_analysis(&run_id, "m");

        for _ in 0..500 {
            store.bump_estimate(&run_id, 1.6);
        }
        let progress = store.snapshot().progress_percent;
        assert!(progress < PROGRESS_ANALYSIS_CEILING);
        assert!(progress > PROGRESS_ANALYSIS_START);

        store.publish_shots(&run_id, vec![]);
        assert!(!store.bump_estimate(&run_id, 1.0));
        assert_eq!(store.snapshot().progress_percent, PROGRESS_ANALYSIS_CEILING);
    }

    #[test]
    fn test_fail_keeps_shots() {
        let store = StateStore::new();
        let run_id = started(&store);
        store.begin_analysis(&run_id, "m");
        store.publish_shots(&run_id, vec![shot(0.0)]);

        assert!(store.fail(&run_id, "disk full"));
        let snap = store.snapshot();
        assert_eq!(snap.stage, PipelineStage::Error);
        assert_eq!(snap.shot_count(), 1);
        assert_eq!(snap.error_message.as_deref(), Some("disk full"));
        assert_eq!(snap.current_stage_label, LABEL_FAILED);
    }

    #[test]
    fn test_terminal_stage_is_final() {
        let store = StateStore::new();
        let run_id = started(&store);
        store.fail(&run_id, "no response");

        assert!(!store.complete(&run_id));
        assert!(!store.fail(&run_id, "again"));
        assert!(!store.mark_encoded(&run_id));
    }

    #[test]
    fn test_reset_returns_to_idle_and_keeps_seq() {
        let store = StateStore::new();
        let run_id = started(&store);
        let before = store.snapshot().seq;

        assert_eq!(store.reset(), Some(run_id));
        let snap = store.snapshot();
        assert_eq!(snap.stage, PipelineStage::Idle);
        assert!(snap.run_id.is_none());
        assert!(snap.seq > before);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = StateStore::new();
        let mut rx = store.subscribe();
        let run_id = started(&store);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().run_id, Some(run_id));
    }
}
