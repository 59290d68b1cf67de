//! Pipeline error types.

use thiserror::Error;

use capburn_media::command::truncate_tail;
use capburn_media::MediaError;
use capburn_models::ValidationError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Subtitle generation failed: {0}")]
    Subtitle(String),

    #[error("Composition graph invalid: {0}")]
    Graph(String),

    #[error("Encode failed: {message}")]
    Encode {
        message: String,
        diagnostics: Option<String>,
    },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn subtitle(msg: impl Into<String>) -> Self {
        Self::Subtitle(msg.into())
    }

    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an encoder failure, keeping at most `max_diagnostic_bytes` of its output.
    pub fn encode(err: MediaError, max_diagnostic_bytes: usize) -> Self {
        let diagnostics = err
            .diagnostics()
            .map(|d| truncate_tail(d, max_diagnostic_bytes).to_string())
            .filter(|d| !d.is_empty());
        Self::Encode {
            message: err.to_string(),
            diagnostics,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Unauthorized => 401,
            PipelineError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Unauthorized => "unauthorized",
            PipelineError::Validation(_) => "validation",
            PipelineError::Download(_) => "download",
            PipelineError::Subtitle(_) => "subtitle",
            PipelineError::Graph(_) => "graph",
            PipelineError::Encode { .. } => "encode",
            PipelineError::Upload(_) => "upload",
            PipelineError::Workspace(_) => "workspace",
            PipelineError::Config(_) => "config",
        }
    }
}
