//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload to R2
//! - Presigned or public artifact URLs
//! - Render artifact key naming and publishing
//! - Bucket connectivity checks

pub mod client;
pub mod error;
pub mod operations;

pub use client::{public_url, R2Client, R2Config, DEFAULT_SIGNED_URL_EXPIRY_SECS};
pub use error::{StorageError, StorageResult};
pub use operations::{artifact_key, PublishedArtifact, RENDERS_PREFIX};
