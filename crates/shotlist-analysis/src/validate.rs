//! Parsing and validation of the model's shot list.

use tracing::warn;

use shotlist_models::Shot;

use crate::error::{AnalysisError, AnalysisResult};

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse the response text into a validated, time-ordered shot list.
///
/// Either every shot passes or the whole list is rejected.
pub fn parse_shots(text: &str) -> AnalysisResult<Vec<Shot>> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let shots: Vec<Shot> = serde_json::from_str(body)
        .map_err(|e| AnalysisError::schema_violation(format!("invalid shot list JSON: {}", e)))?;

    let mut shots = shots
        .into_iter()
        .enumerate()
        .map(|(idx, shot)| {
            shot.check()
                .map(|_| shot.with_formatted_start())
                .map_err(|e| AnalysisError::schema_violation(format!("shot {}: {}", idx, e)))
        })
        .collect::<AnalysisResult<Vec<Shot>>>()?;

    let ordered = shots
        .windows(2)
        .all(|w| w[0].start_time_seconds <= w[1].start_time_seconds);
    if !ordered {
        warn!("Model returned shots out of order, sorting by start time");
        // Stable, and every start is finite after `check`.
        shots.sort_by(|a, b| a.start_time_seconds.total_cmp(&b.start_time_seconds));
    }

    Ok(shots)
}
