//! Shared data models for the Shotlist pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Shots returned by the analysis model
//! - Pipeline stages, run identifiers and state snapshots
//! - Thumbnail slots and the shot card projection
//! - Progress checkpoints shared by the orchestrator and the view

pub mod card;
pub mod payload;
pub mod progress;
pub mod run;
pub mod shot;
pub mod stage;
pub mod utils;

// Re-export common types
pub use card::ShotCard;
pub use payload::EncodedVideo;
pub use run::{PipelineSnapshot, RunId, ThumbnailSlot};
pub use shot::{Shot, ShotError};
pub use stage::PipelineStage;
pub use utils::{format_megabytes, format_time};
