//! Pipeline stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stage of a pipeline run.
///
/// Stages advance strictly in declaration order; `Error` is reachable from
/// the three active stages. Only a reset returns to `Idle`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    /// Waiting for a video
    #[default]
    Idle,
    /// Reading and encoding the video
    ProcessingVideo,
    /// Waiting on the remote analysis model
    Analyzing,
    /// Capturing a thumbnail per shot
    ExtractingFrames,
    /// All captures settled
    Completed,
    /// Encoding or analysis failed
    Error,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ProcessingVideo => "processing_video",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::ExtractingFrames => "extracting_frames",
            PipelineStage::Completed => "completed",
            PipelineStage::Error => "error",
        }
    }

    /// Whether a run is in flight in this stage.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PipelineStage::ProcessingVideo
                | PipelineStage::Analyzing
                | PipelineStage::ExtractingFrames
        )
    }

    /// Whether the run has ended (only a reset leaves this stage).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Error)
    }

    /// Whether `next` is a legal transition from this stage.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (Idle | Completed | Error, ProcessingVideo) => true,
            (ProcessingVideo, Analyzing) => true,
            (Analyzing, ExtractingFrames) => true,
            (ExtractingFrames, Completed) => true,
            (ProcessingVideo | Analyzing | ExtractingFrames, Error) => true,
            (_, Idle) => true,
            _ => false,
        }
    }

    /// Step label shown next to the progress bar.
    pub fn step_label(&self) -> &'static str {
        match self {
            PipelineStage::ProcessingVideo => "Step 1 of 3",
            PipelineStage::Analyzing => "Step 2 of 3",
            PipelineStage::ExtractingFrames => "Step 3 of 3",
            _ => "",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use PipelineStage::*;
        assert!(Idle.can_transition_to(ProcessingVideo));
        assert!(ProcessingVideo.can_transition_to(Analyzing));
        assert!(Analyzing.can_transition_to(ExtractingFrames));
        assert!(ExtractingFrames.can_transition_to(Completed));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use PipelineStage::*;
        assert!(!Idle.can_transition_to(Analyzing));
        assert!(!ProcessingVideo.can_transition_to(ExtractingFrames));
        assert!(!ExtractingFrames.can_transition_to(Analyzing));
        assert!(!Completed.can_transition_to(Error));
        assert!(!Idle.can_transition_to(Error));
    }

    #[test]
    fn test_reset_always_allowed() {
        use PipelineStage::*;
        for stage in [ProcessingVideo, Analyzing, ExtractingFrames, Completed, Error] {
            assert!(stage.can_transition_to(Idle));
        }
    }

    #[test]
    fn test_step_labels() {
        assert_eq!(PipelineStage::Analyzing.step_label(), "Step 2 of 3");
        assert_eq!(PipelineStage::Completed.step_label(), "");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&PipelineStage::ExtractingFrames).unwrap();
        assert_eq!(json, "\"EXTRACTING_FRAMES\"");
    }
}
