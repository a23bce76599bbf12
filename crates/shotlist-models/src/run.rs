//! Run identity and the published view of a run.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::ShotCard;
use crate::shot::Shot;
use crate::stage::PipelineStage;
use crate::utils::format_megabytes;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thumbnail state for one shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThumbnailSlot {
    /// Capture not finished yet.
    #[default]
    Pending,

    /// Capture succeeded.
    Ready {
        /// `data:image/jpeg;base64,...`
        data_url: String,
    },

    /// Capture failed; the shot is displayed without a thumbnail.
    Failed {
        /// Why the capture failed
        reason: String,
    },
}

impl ThumbnailSlot {
    pub fn ready(data_url: impl Into<String>) -> Self {
        Self::Ready {
            data_url: data_url.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the capture has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The image, if present. Failed and pending slots are both absent.
    pub fn data_url(&self) -> Option<&str> {
        match self {
            Self::Ready { data_url } => Some(data_url),
            _ => None,
        }
    }
}

/// Atomic snapshot of a run, published after every state change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    /// Run this snapshot belongs to (absent while idle)
    pub run_id: Option<RunId>,
    /// Current stage
    pub stage: PipelineStage,
    /// Human-readable description of the current work
    pub current_stage_label: String,
    /// "Step N of 3" for active stages
    pub step_label: String,
    /// Progress in percent, 0-100
    pub progress_percent: f64,
    /// Error message when the run failed
    pub error_message: Option<String>,
    /// Shot sequence once analysis succeeded
    pub shots: Option<Vec<Shot>>,
    /// Thumbnail slots, index-aligned with `shots`
    pub thumbnails: Option<Vec<ThumbnailSlot>>,
    /// Name of the submitted file
    pub source_name: Option<String>,
    /// Size of the submitted file in bytes
    pub source_size_bytes: Option<u64>,
    /// Monotonic sequence number across the pipeline's lifetime
    pub seq: u64,
    /// When the snapshot was produced
    pub updated_at: DateTime<Utc>,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl PipelineSnapshot {
    /// Snapshot of a pipeline with no run.
    pub fn idle() -> Self {
        Self {
            run_id: None,
            stage: PipelineStage::Idle,
            current_stage_label: String::new(),
            step_label: String::new(),
            progress_percent: 0.0,
            error_message: None,
            shots: None,
            thumbnails: None,
            source_name: None,
            source_size_bytes: None,
            seq: 0,
            updated_at: Utc::now(),
        }
    }

    /// Number of shots, zero before analysis finished.
    pub fn shot_count(&self) -> usize {
        self.shots.as_ref().map_or(0, Vec::len)
    }

    /// Thumbnail image for a shot, if captured.
    pub fn thumbnail(&self, index: usize) -> Option<&str> {
        self.thumbnails
            .as_ref()
            .and_then(|slots| slots.get(index))
            .and_then(ThumbnailSlot::data_url)
    }

    /// Number of thumbnails that are present.
    pub fn ready_thumbnails(&self) -> usize {
        self.thumbnails
            .as_ref()
            .map_or(0, |slots| slots.iter().filter(|s| s.is_ready()).count())
    }

    /// Number of captures that have finished, successfully or not.
    pub fn settled_thumbnails(&self) -> usize {
        self.thumbnails
            .as_ref()
            .map_or(0, |slots| slots.iter().filter(|s| s.is_settled()).count())
    }

    /// Shot cards in shot order. Cards render before their thumbnails exist.
    pub fn cards(&self) -> Vec<ShotCard> {
        let Some(shots) = self.shots.as_ref() else {
            return Vec::new();
        };
        shots
            .iter()
            .enumerate()
            .map(|(index, shot)| ShotCard::new(index, shot, self.thumbnail(index)))
            .collect()
    }

    /// Results header, e.g. `3 Shots Detected`.
    pub fn results_header(&self) -> String {
        format!("{} Shots Detected", self.shot_count())
    }

    /// Source description, e.g. `clip.mp4 (12.3 MB)`.
    pub fn source_label(&self) -> Option<String> {
        let name = self.source_name.as_ref()?;
        Some(match self.source_size_bytes {
            Some(size) => format!("{} ({})", name, format_megabytes(size)),
            None => name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shot::tests::sample_shot;

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert_eq!(RunId::from_string("abc").as_str(), "abc");
    }

    #[test]
    fn test_thumbnail_slot_states() {
        assert!(!ThumbnailSlot::Pending.is_settled());
        assert!(ThumbnailSlot::ready("data:x").is_settled());
        assert!(ThumbnailSlot::failed("boom").is_settled());
        assert_eq!(ThumbnailSlot::failed("boom").data_url(), None);
        assert_eq!(ThumbnailSlot::ready("data:x").data_url(), Some("data:x"));
    }

    #[test]
    fn test_thumbnail_slot_serialization() {
        let json = serde_json::to_string(&ThumbnailSlot::failed("no frame")).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        let parsed: ThumbnailSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ThumbnailSlot::failed("no frame"));
    }

    #[test]
    fn test_idle_snapshot_has_no_maps() {
        let snapshot = PipelineSnapshot::idle();
        assert_eq!(snapshot.stage, PipelineStage::Idle);
        assert!(snapshot.shots.is_none());
        assert!(snapshot.thumbnails.is_none());
        assert!(snapshot.cards().is_empty());
        assert_eq!(snapshot.shot_count(), 0);
    }

    #[test]
    fn test_counts_and_cards() {
        let mut snapshot = PipelineSnapshot::idle();
        snapshot.shots = Some(vec![
            sample_shot(0.0, 2.0),
            sample_shot(2.0, 4.0),
            sample_shot(4.0, 6.0),
        ]);
        snapshot.thumbnails = Some(vec![
            ThumbnailSlot::ready("data:a"),
            ThumbnailSlot::failed("load"),
            ThumbnailSlot::Pending,
        ]);

        assert_eq!(snapshot.ready_thumbnails(), 1);
        assert_eq!(snapshot.settled_thumbnails(), 2);
        assert_eq!(snapshot.results_header(), "3 Shots Detected");

        let cards = snapshot.cards();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].thumbnail.as_deref(), Some("data:a"));
        assert!(cards[1].thumbnail.is_none());
        assert_eq!(cards[2].index, 2);
    }

    #[test]
    fn test_source_label() {
        let mut snapshot = PipelineSnapshot::idle();
        assert!(snapshot.source_label().is_none());
        snapshot.source_name = Some("clip.mp4".to_string());
        snapshot.source_size_bytes = Some(3 * 1024 * 1024);
        assert_eq!(snapshot.source_label().unwrap(), "clip.mp4 (3.0 MB)");
    }
}
