//! HTTP download of source media and watermark assets.
//!
//! Bodies are streamed chunk by chunk into the destination file. A failed or
//! timed-out download removes the partial file.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Default whole-download timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

const USER_AGENT: &str = concat!("capburn/", env!("CARGO_PKG_VERSION"));

/// Streams remote files to disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Create a fetcher with its own client. Zero disables the timeout.
    pub fn new(timeout_secs: u64) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MediaError::download_failed(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, timeout_secs))
    }

    pub fn with_client(client: reqwest::Client, timeout_secs: u64) -> Self {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        Self { client, timeout }
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        info!(url = %url, dest = %dest.display(), "Downloading");

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.stream_to_file(url, dest)).await {
                Ok(result) => result,
                Err(_) => Err(MediaError::Timeout(limit.as_secs())),
            },
            None => self.stream_to_file(url, dest).await,
        };

        match result {
            Ok(bytes) => {
                debug!(url = %url, bytes, "Download complete");
                Ok(bytes)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(dest = %dest.display(), "Failed to remove partial download: {}", rm);
                    }
                }
                Err(e)
            }
        }
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> MediaResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "HTTP {} fetching {}",
                status, url
            )));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::download_failed(format!("Reading body of {} failed: {}", url, e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(MediaError::download_failed(format!("Empty response body from {}", url)));
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("source.mp4");
        let fetcher = HttpFetcher::new(10).unwrap();
        let written = fetcher
            .fetch_to_file(&format!("{}/video.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wm.png");
        let err = HttpFetcher::new(10)
            .unwrap()
            .fetch_to_file(&format!("{}/missing.png", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_empty_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.mp4");
        let result = HttpFetcher::new(10)
            .unwrap()
            .fetch_to_file(&server.uri(), &dest)
            .await;

        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 16])
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = HttpFetcher::new(1)
            .unwrap()
            .fetch_to_file(&server.uri(), &dir.path().join("slow.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let dir = tempfile::tempdir().unwrap();
        let err = HttpFetcher::new(5)
            .unwrap()
            .fetch_to_file("http://127.0.0.1:9/nothing", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }
}
