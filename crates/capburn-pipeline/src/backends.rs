//! External collaborators of the render pipeline.
//!
//! Each collaborator sits behind a trait so the pipeline can run against
//! fakes in tests. The defaults wrap the media and storage crates.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use capburn_media::{probe_video, FfmpegCommand, FfmpegRunner, HttpFetcher, MediaResult, VideoInfo};
use capburn_storage::{PublishedArtifact, R2Client, StorageResult};

use crate::callback::{HttpNotifier, Notifier};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Downloads a remote file to a local path.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &Url, dest: &Path) -> MediaResult<u64>;
}

/// Reads resolution and stream info from a local video.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;
}

/// Runs an encoder invocation to completion.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, command: &FfmpegCommand) -> MediaResult<()>;
}

/// Publishes rendered files and reports store health.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn publish(
        &self,
        path: &Path,
        safe_job_id: &str,
        extension: &str,
        content_type: &str,
    ) -> StorageResult<PublishedArtifact>;

    async fn check(&self) -> StorageResult<()>;
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> MediaResult<u64> {
        self.fetch_to_file(url.as_str(), dest).await
    }
}

/// Prober backed by the `ffprobe` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeProber;

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }
}

#[async_trait]
impl Encoder for FfmpegRunner {
    async fn encode(&self, command: &FfmpegCommand) -> MediaResult<()> {
        self.run(command).await
    }
}

#[async_trait]
impl ArtifactStore for R2Client {
    async fn publish(
        &self,
        path: &Path,
        safe_job_id: &str,
        extension: &str,
        content_type: &str,
    ) -> StorageResult<PublishedArtifact> {
        self.publish_artifact(path, safe_job_id, extension, content_type)
            .await
    }

    async fn check(&self) -> StorageResult<()> {
        self.check_connectivity().await
    }
}

/// The full set of collaborators used by one pipeline.
#[derive(Clone)]
pub struct Backends {
    pub fetcher: Arc<dyn MediaFetcher>,
    pub prober: Arc<dyn MediaProber>,
    pub encoder: Arc<dyn Encoder>,
    pub store: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Backends {
    /// Production collaborators: HTTP fetch, ffprobe, ffmpeg and the given store.
    pub fn production(config: &PipelineConfig, store: Arc<dyn ArtifactStore>) -> PipelineResult<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout_secs)
            .map_err(|e| PipelineError::config_error(e.to_string()))?;
        let encoder = FfmpegRunner::new()
            .with_timeout(config.encode_timeout_secs)
            .with_max_diagnostic_bytes(config.max_diagnostic_bytes);
        let notifier = HttpNotifier::new(config.callback_timeout_secs)?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            prober: Arc::new(FfprobeProber),
            encoder: Arc::new(encoder),
            store,
            notifier: Arc::new(notifier),
        })
    }
}
