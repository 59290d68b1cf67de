//! Shared data models for the caption burn-in service.
//!
//! This crate provides Serde-serializable types for:
//! - Caption frames and style configuration
//! - Render requests and validated render jobs
//! - Plan tiers and their watermark policy
//! - Video resolution and encoding configuration

pub mod caption;
pub mod encoding;
pub mod job;
pub mod plan;
pub mod style;
pub mod video;

// Re-export common types
pub use caption::{CaptionFrame, DEFAULT_FRAME_DURATION_MS};
pub use encoding::EncodingConfig;
pub use job::{JobId, RenderJob, RenderRequest, ValidationError, WatermarkSource};
pub use plan::PlanTier;
pub use style::{
    FontWeight, LineStyle, ResolvedStyle, StyleConfig, StyleDefaults, REFERENCE_HEIGHT,
};
pub use video::VideoMetadata;
