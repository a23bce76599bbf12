//! Shot descriptors produced by the analysis model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::utils::format_time;

/// A continuous camera take identified by the analysis step.
///
/// Field names follow the model's response contract (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    /// Start of the shot in seconds
    #[validate(range(min = 0.0))]
    pub start_time_seconds: f64,

    /// End of the shot in seconds (strictly after the start)
    pub end_time_seconds: f64,

    /// Start formatted as MM:SS, display only
    #[serde(default)]
    pub start_time_formatted: String,

    /// What happens in the shot
    #[validate(length(min = 1))]
    pub description: String,

    /// Cinematographic category (e.g. "Wide Shot", "Close Up")
    #[validate(length(min = 1))]
    pub shot_type: String,

    /// Camera movement technique (e.g. "Static", "Dolly", "Handheld")
    #[validate(length(min = 1))]
    pub camera_movement: String,

    /// Emotional tone of the shot
    #[validate(length(min = 1))]
    pub mood: String,

    /// Self-sufficient image generation prompt for the shot
    #[validate(length(min = 1))]
    pub image_prompt: String,
}

/// Reasons a shot fails its contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShotError {
    #[error("invalid fields: {0}")]
    InvalidFields(String),

    #[error("non-finite timestamp")]
    NonFiniteTime,

    #[error("end time {end} is not after start time {start}")]
    InvalidTimeRange { start: f64, end: f64 },
}

impl Shot {
    /// Check the shot against its contract.
    ///
    /// String fields are trimmed-checked: whitespace-only counts as empty.
    pub fn check(&self) -> Result<(), ShotError> {
        if !self.start_time_seconds.is_finite() || !self.end_time_seconds.is_finite() {
            return Err(ShotError::NonFiniteTime);
        }

        if let Err(errors) = self.validate() {
            let mut fields: Vec<String> =
                errors.field_errors().keys().map(|k| k.to_string()).collect();
            fields.sort();
            return Err(ShotError::InvalidFields(fields.join(", ")));
        }

        let blank: Vec<&str> = [
            ("description", &self.description),
            ("shotType", &self.shot_type),
            ("cameraMovement", &self.camera_movement),
            ("mood", &self.mood),
            ("imagePrompt", &self.image_prompt),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !blank.is_empty() {
            return Err(ShotError::InvalidFields(blank.join(", ")));
        }

        if self.end_time_seconds <= self.start_time_seconds {
            return Err(ShotError::InvalidTimeRange {
                start: self.start_time_seconds,
                end: self.end_time_seconds,
            });
        }

        Ok(())
    }

    /// Fill `start_time_formatted` from the start time when the model left it blank.
    pub fn with_formatted_start(mut self) -> Self {
        if self.start_time_formatted.trim().is_empty() {
            self.start_time_formatted = format_time(self.start_time_seconds);
        }
        self
    }

    /// Shot length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.end_time_seconds - self.start_time_seconds
    }
}
