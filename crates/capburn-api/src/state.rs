//! Application state.

use std::sync::Arc;

use capburn_pipeline::{Backends, PipelineConfig, RenderPipeline};
use capburn_storage::R2Client;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<RenderPipeline>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: RenderPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build state with production backends from the environment.
    pub async fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pipeline_config = PipelineConfig::from_env()?;
        let storage = R2Client::from_env().await?;
        let backends = Backends::production(&pipeline_config, Arc::new(storage))?;

        Ok(Self::new(config, RenderPipeline::new(pipeline_config, backends)))
    }
}
