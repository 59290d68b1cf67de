//! Completion callbacks.
//!
//! Delivery is fire-and-forget: the render response never waits on it and a
//! failed delivery is only logged, on the `capburn::callback` target.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{PipelineError, PipelineResult};

/// Log target for callback delivery.
pub const CALLBACK_TARGET: &str = "capburn::callback";

/// Body posted to a job's callback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub render_secret: String,
    pub job_id: String,
    pub status: String,
    pub video_url: String,
}

impl CallbackPayload {
    pub fn success(render_secret: &str, job_id: &str, video_url: &str) -> Self {
        Self {
            render_secret: render_secret.to_string(),
            job_id: job_id.to_string(),
            status: "success".to_string(),
            video_url: video_url.to_string(),
        }
    }
}

/// Sends completion notifications without blocking the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, url: Url, payload: CallbackPayload);
}

/// Notifier posting JSON over HTTP from a detached task.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(timeout_secs: u64) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PipelineError::config_error(format!("callback client: {}", e)))?;
        Ok(Self::with_client(client, timeout_secs))
    }

    pub fn with_client(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Deliver one callback and wait for the response.
    pub async fn send(&self, url: &Url, payload: &CallbackPayload) -> Result<(), String> {
        deliver(&self.client, self.timeout, url, payload).await
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, url: Url, payload: CallbackPayload) {
        let client = self.client.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            match deliver(&client, timeout, &url, &payload).await {
                Ok(()) => debug!(
                    target: CALLBACK_TARGET,
                    job_id = %payload.job_id,
                    "Callback delivered"
                ),
                Err(e) => warn!(
                    target: CALLBACK_TARGET,
                    job_id = %payload.job_id,
                    host = url.host_str().unwrap_or(""),
                    "Callback failed: {}", e
                ),
            }
        });
    }
}

async fn deliver(
    client: &reqwest::Client,
    timeout: Duration,
    url: &Url,
    payload: &CallbackPayload,
) -> Result<(), String> {
    let request = client.post(url.clone()).json(payload).send();
    let response = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| format!("timed out after {}s", timeout.as_secs()))?
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> CallbackPayload {
        CallbackPayload::success("s3cret", "job-1", "https://cdn.test/renders/job-1-1.mp4")
    }

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["render_secret"], "s3cret");
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["video_url"], "https://cdn.test/renders/job-1-1.mp4");
    }

    #[tokio::test]
    async fn test_notify_posts_payload_in_background() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(payload()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(5).unwrap();
        let url = Url::parse(&format!("{}/hook", server.uri())).unwrap();
        notifier.notify(url, payload());

        for _ in 0..100 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_send_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(5).unwrap();
        let url = Url::parse(&format!("{}/hook", server.uri())).unwrap();
        let err = notifier.send(&url, &payload()).await.unwrap_err();
        assert!(err.contains("503"));
    }

    #[tokio::test]
    async fn test_send_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(1).unwrap();
        let url = Url::parse(&format!("{}/hook", server.uri())).unwrap();
        let err = notifier.send(&url, &payload()).await.unwrap_err();
        assert!(err.contains("timed out"));
    }
}
