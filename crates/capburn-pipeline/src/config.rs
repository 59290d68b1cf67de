//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;

use capburn_media::command::DEFAULT_MAX_DIAGNOSTIC_BYTES;
use capburn_media::download::DEFAULT_FETCH_TIMEOUT_SECS;
use capburn_media::watermark::{DEFAULT_WATERMARK_FONT, DEFAULT_WATERMARK_TEXT};
use capburn_models::EncodingConfig;

use crate::error::{PipelineError, PipelineResult};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Shared secret callers must present
    pub render_secret: String,
    /// Parent directory for per-job workspaces
    pub work_dir: PathBuf,
    /// Directory of font files made available to libass and drawtext
    pub fonts_dir: Option<PathBuf>,
    /// Text used when the watermark falls back to text mode
    pub watermark_text: String,
    /// Font family for the text watermark
    pub watermark_font: String,
    /// Caption scale policy name (`linear` or `sqrt`)
    pub scale_policy: String,
    /// Encode timeout in seconds (0 = none)
    pub encode_timeout_secs: u64,
    /// Source and watermark download timeout in seconds (0 = none)
    pub fetch_timeout_secs: u64,
    /// Callback request timeout in seconds
    pub callback_timeout_secs: u64,
    /// Upper bound on encoder diagnostics kept in errors
    pub max_diagnostic_bytes: usize,
    /// Output encoding
    pub encoding: EncodingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_secret: String::new(),
            work_dir: std::env::temp_dir().join("capburn"),
            fonts_dir: None,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            watermark_font: DEFAULT_WATERMARK_FONT.to_string(),
            scale_policy: "linear".to_string(),
            encode_timeout_secs: 1800,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            callback_timeout_secs: 10,
            max_diagnostic_bytes: DEFAULT_MAX_DIAGNOSTIC_BYTES,
            encoding: EncodingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables. `RENDER_SECRET` is required.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let render_secret = std::env::var("RENDER_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PipelineError::config_error("RENDER_SECRET not set"))?;

        Ok(Self {
            render_secret,
            work_dir: std::env::var("WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            fonts_dir: std::env::var("FONTS_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            watermark_text: std::env::var("WATERMARK_TEXT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.watermark_text),
            watermark_font: std::env::var("WATERMARK_FONT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.watermark_font),
            scale_policy: std::env::var("CAPTION_SCALE_POLICY").unwrap_or(defaults.scale_policy),
            encode_timeout_secs: env_or("ENCODE_TIMEOUT_SECS", defaults.encode_timeout_secs),
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            callback_timeout_secs: env_or("CALLBACK_TIMEOUT_SECS", defaults.callback_timeout_secs),
            max_diagnostic_bytes: env_or("MAX_DIAGNOSTIC_BYTES", defaults.max_diagnostic_bytes),
            encoding: defaults.encoding,
        })
    }

    /// Config for tests and embedding, with the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            render_secret: secret.into(),
            ..Default::default()
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
