//! Shot card projection consumed by the presentation layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shot::Shot;

/// One browsable card: a shot, its thumbnail if captured, and its prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotCard {
    /// 0-based position in the shot sequence
    pub index: usize,
    /// 1-based display number
    pub number: usize,
    /// `MM:SS` start, as given by the model or derived locally
    pub timecode: String,
    /// Shot length in seconds
    pub duration_seconds: f64,
    pub shot_type: String,
    pub camera_movement: String,
    pub mood: String,
    pub description: String,
    /// Prompt text ready to copy into an image generator
    pub image_prompt: String,
    /// Captured still (`data:image/jpeg;base64,...`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ShotCard {
    pub fn new(index: usize, shot: &Shot, thumbnail: Option<&str>) -> Self {
        Self {
            index,
            number: index + 1,
            timecode: shot.clone().with_formatted_start().start_time_formatted,
            duration_seconds: shot.duration_seconds(),
            shot_type: shot.shot_type.clone(),
            camera_movement: shot.camera_movement.clone(),
            mood: shot.mood.clone(),
            description: shot.description.clone(),
            image_prompt: shot.image_prompt.trim().to_string(),
            thumbnail: thumbnail.map(str::to_string),
        }
    }

    /// Text placed on the clipboard by the "copy prompt" action.
    pub fn copy_text(&self) -> &str {
        &self.image_prompt
    }
}
