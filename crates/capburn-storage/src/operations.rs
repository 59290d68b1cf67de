//! High-level storage operations.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

/// Prefix for rendered videos.
pub const RENDERS_PREFIX: &str = "renders";

/// A published render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedArtifact {
    /// Object key in the bucket
    pub key: String,
    /// URL handed to the client (public or presigned)
    pub url: String,
}

/// Object key for a rendered video: `renders/<job>-<timestamp_ms>.<ext>`.
///
/// `safe_job_id` must already be restricted to `[A-Za-z0-9_-]`.
pub fn artifact_key(safe_job_id: &str, at: DateTime<Utc>, extension: &str) -> StorageResult<String> {
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    if !valid(safe_job_id) {
        return Err(StorageError::InvalidKey(format!("job id '{}'", safe_job_id)));
    }
    if !valid(extension) {
        return Err(StorageError::InvalidKey(format!("extension '{}'", extension)));
    }
    Ok(format!(
        "{}/{}-{}.{}",
        RENDERS_PREFIX,
        safe_job_id,
        at.timestamp_millis(),
        extension
    ))
}

impl R2Client {
    /// Upload a rendered file and return its key and client URL.
    pub async fn publish_artifact(
        &self,
        path: impl AsRef<Path>,
        safe_job_id: &str,
        extension: &str,
        content_type: &str,
    ) -> StorageResult<PublishedArtifact> {
        let key = artifact_key(safe_job_id, Utc::now(), extension)?;
        self.upload_file(path, &key, content_type).await?;
        let url = self.object_url(&key).await?;
        info!(key = %key, bucket = %self.bucket(), "Published artifact");
        Ok(PublishedArtifact { key, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_artifact_key_format() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            artifact_key("job_42", at, "mp4").unwrap(),
            "renders/job_42-1700000000123.mp4"
        );
    }

    #[test]
    fn test_artifact_key_rejects_unsafe_parts() {
        let at = Utc::now();
        assert!(artifact_key("../etc", at, "mp4").is_err());
        assert!(artifact_key("", at, "mp4").is_err());
        assert!(artifact_key("ok", at, "mp4/x").is_err());
    }

    #[test]
    fn test_keys_differ_per_millisecond() {
        let a = Utc.timestamp_millis_opt(1).unwrap();
        let b = Utc.timestamp_millis_opt(2).unwrap();
        assert_ne!(
            artifact_key("job", a, "mp4").unwrap(),
            artifact_key("job", b, "mp4").unwrap()
        );
    }
}
