//! Instruction block and response schema for shot analysis.

use serde_json::{json, Value};

/// Fields the model must fill for every shot.
pub const REQUIRED_SHOT_FIELDS: [&str; 7] = [
    "startTimeSeconds",
    "endTimeSeconds",
    "description",
    "shotType",
    "cameraMovement",
    "mood",
    "imagePrompt",
];

/// Instructions sent alongside the video.
pub const SHOT_ANALYSIS_PROMPT: &str = r#"
You are a professional film editor and cinematographer. Break this video down into its shots.

Segmentation rules:
1. Treat each complete, continuous take (including long takes) as ONE shot. Camera motion alone
   (pans, tilts, dolly moves, handheld drift) is never a reason to split a shot.
2. Start a new shot only at a clear editing transition: a hard cut, a dissolve, or a wipe.
3. Shots must be listed in chronological order and must not overlap.

For every shot provide:
- startTimeSeconds and endTimeSeconds: precise boundaries in seconds.
- startTimeFormatted: the start time as MM:SS.
- description: a detailed visual description of what happens in the shot.
- shotType: the cinematic shot type (e.g. Close-up, Medium Shot, Wide Shot).
- cameraMovement: the camera technique (e.g. Static, Pan, Dolly, Handheld, Tracking Shot).
- mood: the emotional tone or atmosphere.
- imagePrompt: a comprehensive, high-fidelity prompt for an AI image generator (Midjourney/Flux
  style) that stands on its own and captures the whole shot: lighting, color grading, subject
  movement and camera trajectory.

Respond with JSON only.
"#;

/// `responseSchema` for the `generateContent` request: an array of shot objects.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "startTimeSeconds": { "type": "NUMBER", "description": "Start time of the shot in seconds" },
                "endTimeSeconds": { "type": "NUMBER", "description": "End time of the shot in seconds" },
                "startTimeFormatted": { "type": "STRING", "description": "Start time formatted as MM:SS" },
                "description": { "type": "STRING", "description": "Detailed description of the action and content" },
                "shotType": { "type": "STRING", "description": "Cinematic shot type (e.g. Medium Shot, Close Up)" },
                "cameraMovement": { "type": "STRING", "description": "Camera movement technique" },
                "mood": { "type": "STRING", "description": "The emotional tone or atmosphere" },
                "imagePrompt": { "type": "STRING", "description": "A detailed prompt for generating a similar image" }
            },
            "required": REQUIRED_SHOT_FIELDS
        }
    })
}
