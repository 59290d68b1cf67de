//! Render requests and validated render jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use crate::{CaptionFrame, PlanTier, ResolvedStyle, StyleConfig, StyleDefaults};

/// Maximum accepted length of a job id.
pub const MAX_JOB_ID_LENGTH: usize = 128;

/// Errors raised while validating a render request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Identifier of a render job.
///
/// Holds the caller's id verbatim and a filesystem/object-key safe form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create from the caller-supplied id.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id restricted to `[A-Za-z0-9_-]`, safe for paths and object keys.
    pub fn safe_name(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render request as received on the wire.
///
/// Required fields are optional here so that a missing field surfaces as a
/// [`ValidationError`] rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub frames: Vec<CaptionFrame>,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub watermark_url: Option<String>,
    #[serde(default)]
    pub plan_tier: PlanTier,
    /// Inline credential, used when no credential header is present
    #[serde(default)]
    pub render_secret: Option<String>,
}

/// Watermark asset location as supplied by the caller.
///
/// A malformed URL is kept rather than rejected: watermark problems only
/// ever demote the watermark, they never fail the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkSource {
    Valid(Url),
    Invalid(String),
}

impl WatermarkSource {
    fn parse(raw: &str) -> Self {
        match parse_http_url(raw, "watermark_url") {
            Ok(url) => Self::Valid(url),
            Err(_) => Self::Invalid(raw.to_string()),
        }
    }

    /// The parsed URL, if it was usable.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Valid(url) => Some(url),
            Self::Invalid(_) => None,
        }
    }
}

/// A validated render job. Constructed once per request.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub job_id: JobId,
    pub video_url: Url,
    pub frames: Vec<CaptionFrame>,
    pub style: ResolvedStyle,
    pub callback_url: Option<Url>,
    pub watermark_url: Option<WatermarkSource>,
    pub plan_tier: PlanTier,
}

impl RenderRequest {
    /// Validate required fields and resolve the style.
    pub fn validate(&self, defaults: &StyleDefaults) -> Result<RenderJob, ValidationError> {
        let job_id = required(self.job_id.as_deref(), "job_id")?;
        if job_id.len() > MAX_JOB_ID_LENGTH {
            return Err(ValidationError::invalid(
                "job_id",
                format!("longer than {} characters", MAX_JOB_ID_LENGTH),
            ));
        }

        let video_url = parse_http_url(required(self.video_url.as_deref(), "video_url")?, "video_url")?;

        // Optional URLs are dropped when blank; a malformed callback is a client error.
        let callback_url = optional(self.callback_url.as_deref())
            .map(|u| parse_http_url(u, "callback_url"))
            .transpose()?;
        let watermark_url = optional(self.watermark_url.as_deref()).map(WatermarkSource::parse);

        Ok(RenderJob {
            job_id: JobId::from_string(job_id),
            video_url,
            frames: self.frames.clone(),
            style: self.style.resolve(defaults),
            callback_url,
            watermark_url,
            plan_tier: self.plan_tier,
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ValidationError> {
    optional(value).ok_or(ValidationError::MissingField(field))
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_http_url(raw: &str, field: &'static str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::invalid(
            field,
            format!("unsupported scheme '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RenderRequest {
        RenderRequest {
            job_id: Some("job-1".to_string()),
            video_url: Some("https://cdn.example.com/in.mp4".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request() {
        let job = request().validate(&StyleDefaults::default()).unwrap();
        assert_eq!(job.job_id.as_str(), "job-1");
        assert_eq!(job.plan_tier, PlanTier::Free);
        assert!(job.callback_url.is_none());
        assert_eq!(job.style.top.font_family, "Lexend");
    }

    #[test]
    fn test_missing_fields() {
        let mut req = request();
        req.job_id = None;
        assert_eq!(
            req.validate(&StyleDefaults::default()).unwrap_err(),
            ValidationError::MissingField("job_id")
        );

        let mut req = request();
        req.video_url = Some("   ".to_string());
        assert_eq!(
            req.validate(&StyleDefaults::default()).unwrap_err(),
            ValidationError::MissingField("video_url")
        );
    }

    #[test]
    fn test_invalid_urls() {
        let mut req = request();
        req.video_url = Some("file:///etc/passwd".to_string());
        assert!(matches!(
            req.validate(&StyleDefaults::default()),
            Err(ValidationError::InvalidField { field: "video_url", .. })
        ));

        let mut req = request();
        req.callback_url = Some("not a url".to_string());
        assert!(matches!(
            req.validate(&StyleDefaults::default()),
            Err(ValidationError::InvalidField { field: "callback_url", .. })
        ));
    }

    #[test]
    fn test_blank_optional_urls_are_ignored() {
        let mut req = request();
        req.watermark_url = Some("".to_string());
        let job = req.validate(&StyleDefaults::default()).unwrap();
        assert!(job.watermark_url.is_none());
    }

    #[test]
    fn test_malformed_watermark_url_is_kept() {
        for tier in [PlanTier::Free, PlanTier::Paid] {
            let mut req = request();
            req.plan_tier = tier;
            req.watermark_url = Some("not a url".to_string());
            let job = req.validate(&StyleDefaults::default()).unwrap();
            assert_eq!(
                job.watermark_url,
                Some(WatermarkSource::Invalid("not a url".to_string()))
            );
        }

        let mut req = request();
        req.watermark_url = Some("ftp://assets.test/logo.png".to_string());
        let job = req.validate(&StyleDefaults::default()).unwrap();
        assert!(job.watermark_url.unwrap().url().is_none());

        let mut req = request();
        req.watermark_url = Some("https://assets.test/logo.png".to_string());
        let job = req.validate(&StyleDefaults::default()).unwrap();
        assert_eq!(
            job.watermark_url.unwrap().url().map(Url::as_str),
            Some("https://assets.test/logo.png")
        );
    }

    #[test]
    fn test_safe_name() {
        let id = JobId::from_string("../evil job/1");
        assert_eq!(id.safe_name(), "___evil_job_1");
    }

    #[test]
    fn test_deserialize_full_request() {
        let req: RenderRequest = serde_json::from_str(
            r#"{
                "job_id": "abc",
                "video_url": "https://x.test/v.mp4",
                "frames": [{"start": 0, "end": 2000, "line1": "Hello", "line2": "World"}],
                "style": {"fontTop": "Inter"},
                "plan_tier": "paid",
                "render_secret": "s3cret"
            }"#,
        )
        .unwrap();
        assert_eq!(req.frames.len(), 1);
        assert_eq!(req.plan_tier, PlanTier::Paid);
        assert_eq!(req.render_secret.as_deref(), Some("s3cret"));
    }
}
