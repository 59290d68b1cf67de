//! Caption burn-in render pipeline.
//!
//! This crate provides:
//! - The render orchestrator and its step-by-step failure policy
//! - Collaborator traits with HTTP, ffprobe, ffmpeg and R2 backends
//! - Shared-secret authentication
//! - Detached completion callbacks
//! - Structured job logging and pipeline metrics

pub mod auth;
pub mod backends;
pub mod callback;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use auth::{header_credential, SecretVerifier, SECRET_HEADER};
pub use backends::{ArtifactStore, Backends, Encoder, FfprobeProber, MediaFetcher, MediaProber};
pub use callback::{CallbackPayload, HttpNotifier, Notifier};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use pipeline::{RenderPipeline, RenderReport, Step};
