//! Client for the remote shot-analysis model (Google Gemini).
//!
//! This crate provides:
//! - The `ShotAnalyzer` seam used by the pipeline
//! - A Gemini `generateContent` client with a structured-output schema
//! - Validation of the returned shot list
//! - An opt-in retry wrapper for transient failures

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod retry;
mod types;
pub mod validate;

pub use client::{GeminiAnalyzer, ShotAnalyzer};
pub use config::GeminiConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use retry::{RetryConfig, RetryingAnalyzer};
pub use validate::parse_shots;
