//! Gemini AI client for shot-level video analysis.
//!
//! Sends the whole video inline with a fixed instruction block and a
//! response schema, then validates the returned shot list.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use shotlist_models::{EncodedVideo, Shot};

use crate::config::GeminiConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::prompt::{response_schema, SHOT_ANALYSIS_PROMPT};
use crate::types::{
    Content, ErrorEnvelope, GeminiRequest, GeminiResponse, GenerationConfig, InlineData, Part,
};
use crate::validate::parse_shots;

/// Turns an encoded video into an ordered shot list.
#[async_trait]
pub trait ShotAnalyzer: Send + Sync {
    /// Analyze the video. Returns a fully validated list or an error, never a subset.
    async fn analyze(&self, payload: &EncodedVideo) -> AnalysisResult<Vec<Shot>>;

    /// Name shown while the analysis is running.
    fn model_name(&self) -> &str {
        "Analysis model"
    }
}

/// Gemini API client.
pub struct GeminiAnalyzer {
    config: GeminiConfig,
    client: Client,
}

impl GeminiAnalyzer {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables.
    pub fn from_env() -> AnalysisResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_request(payload: &EncodedVideo) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: payload.mime_type.clone(),
                            data: payload.data.clone(),
                        },
                    },
                    Part::Text {
                        text: SHOT_ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.config.timeout.as_secs())
        } else {
            let status = e.status().map(|s| s.as_u16());
            // Strip the URL: it carries the API key.
            AnalysisError::remote(
                format!("Gemini API request failed: {}", e.without_url()),
                status,
            )
        }
    }

    /// Call Gemini API.
    async fn call_gemini_api(&self, payload: &EncodedVideo) -> AnalysisResult<String> {
        let request = Self::build_request(payload);

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| match env.error.status {
                    Some(kind) => format!("{} ({})", env.error.message, kind),
                    None => env.error.message,
                })
                .unwrap_or_else(|_| body.trim().to_string());
            return Err(AnalysisError::remote(
                format!("Gemini API returned {}: {}", status, message),
                Some(status.as_u16()),
            ));
        }

        if body.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::remote(format!("Failed to parse Gemini response: {}", e), None)
        })?;

        if let Some(reason) = gemini_response.block_reason() {
            return Err(AnalysisError::remote(
                format!("Gemini blocked the request: {}", reason),
                None,
            ));
        }

        match gemini_response.text() {
            Some(text) if !text.trim().is_empty() => {
                debug!(
                    "Gemini finished with {:?}, {} chars",
                    gemini_response.finish_reason(),
                    text.len()
                );
                Ok(text)
            }
            _ => Err(AnalysisError::EmptyResponse),
        }
    }
}

#[async_trait]
impl ShotAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, payload: &EncodedVideo) -> AnalysisResult<Vec<Shot>> {
        info!(
            "Sending {} ({} base64 chars) to {}",
            payload.mime_type,
            payload.encoded_len(),
            self.config.model
        );

        let text = match self.call_gemini_api(payload).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Gemini analysis failed with model {}: {}", self.config.model, e);
                return Err(e);
            }
        };

        let shots = parse_shots(&text)?;
        info!("Gemini returned {} shots", shots.len());
        Ok(shots)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
