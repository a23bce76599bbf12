//! Shot-analysis pipeline.
//!
//! Takes a short video through three stages:
//! 1. Encode the video for the analysis request
//! 2. Ask the analysis model for an ordered shot list
//! 3. Capture one thumbnail per shot with a bounded worker pool
//!
//! Progress is published as [`shotlist_models::PipelineSnapshot`]s through a
//! `watch` channel.

pub mod config;
pub mod error;
pub mod estimator;
pub mod extraction;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod state;
pub mod validation;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult, FALLBACK_ERROR_MESSAGE};
pub use extraction::{CaptureJob, ExtractionPool, ExtractionSummary};
pub use logging::RunLogger;
pub use orchestrator::{with_retries, Pipeline};
pub use state::StateStore;
pub use validation::validate_input;
