//! Render pipeline orchestrator.
//!
//! One call to [`RenderPipeline::handle`] runs one job to completion:
//! auth, validation, source download, probe, optional watermark download,
//! subtitle document, composition graph, encode, upload and an optional
//! detached callback. Probe and watermark failures degrade; everything
//! else aborts and skips the remaining steps.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, Instrument};

use capburn_media::{
    policy_from_name, select_mode, AssetAvailability, CompositionGraph, FfmpegCommand, FontIndex,
    GraphBuilder, JobWorkspace, LayoutCalculator, SubtitleDocument, WatermarkConfig, WatermarkMode,
};
use capburn_models::{RenderJob, RenderRequest, StyleDefaults, VideoMetadata, WatermarkSource};

use crate::auth::SecretVerifier;
use crate::backends::Backends;
use crate::callback::CallbackPayload;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Auth,
    Validate,
    DownloadVideo,
    ProbeResolution,
    DownloadWatermark,
    BuildSubtitles,
    BuildGraph,
    Encode,
    Upload,
    Callback,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Auth => "auth",
            Step::Validate => "validate",
            Step::DownloadVideo => "download_video",
            Step::ProbeResolution => "probe_resolution",
            Step::DownloadWatermark => "download_watermark",
            Step::BuildSubtitles => "build_subtitles",
            Step::BuildGraph => "build_graph",
            Step::Encode => "encode",
            Step::Upload => "upload",
            Step::Callback => "callback",
        }
    }
}

/// Summary of a successful render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub job_id: String,
    pub video_url: String,
    pub artifact_key: String,
    pub watermark_mode: WatermarkMode,
    pub resolution: VideoMetadata,
    pub subtitle_events: usize,
    pub graph_stages: usize,
}

/// Stateless render pipeline. Shared across requests.
pub struct RenderPipeline {
    config: PipelineConfig,
    backends: Backends,
    verifier: SecretVerifier,
    fonts: FontIndex,
    layout: LayoutCalculator,
    style_defaults: StyleDefaults,
    watermark: WatermarkConfig,
}

impl RenderPipeline {
    /// Build the pipeline. The font directory is indexed once here.
    pub fn new(config: PipelineConfig, backends: Backends) -> Self {
        let fonts = FontIndex::build_or_empty(config.fonts_dir.as_deref());
        let font_file = fonts
            .resolve(&config.watermark_font, true)
            .map(Path::to_path_buf);
        let watermark = WatermarkConfig::default()
            .with_text(config.watermark_text.as_str())
            .with_font(config.watermark_font.as_str(), font_file);
        let layout = LayoutCalculator::new(policy_from_name(&config.scale_policy));

        debug!(
            policy = layout.policy_name(),
            fonts_indexed = !fonts.is_empty(),
            "Render pipeline ready"
        );

        Self {
            verifier: SecretVerifier::new(&config.render_secret),
            config,
            backends,
            fonts,
            layout,
            style_defaults: StyleDefaults::default(),
            watermark,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Check the header credential, falling back to the inline one.
    pub fn authorize(&self, header: Option<&str>, inline: Option<&str>) -> PipelineResult<()> {
        self.verifier.authorize(header, inline)
    }

    /// Run one render request end to end.
    pub async fn handle(
        &self,
        request: RenderRequest,
        header_secret: Option<&str>,
    ) -> PipelineResult<RenderReport> {
        let started = Instant::now();
        let result = self.run(request, header_secret).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_render(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        request: RenderRequest,
        header_secret: Option<&str>,
    ) -> PipelineResult<RenderReport> {
        let start = Instant::now();
        self.authorize(header_secret, request.render_secret.as_deref())?;
        metrics::record_step_duration(Step::Auth.as_str(), start.elapsed().as_secs_f64());

        let start = Instant::now();
        let job = request.validate(&self.style_defaults)?;
        metrics::record_step_duration(Step::Validate.as_str(), start.elapsed().as_secs_f64());

        let logger = JobLogger::new(&job.job_id, "render");
        let span = logger.create_span();
        self.execute(&job, &logger).instrument(span).await
    }

    async fn execute(&self, job: &RenderJob, logger: &JobLogger) -> PipelineResult<RenderReport> {
        logger.log_start(&format!(
            "{} frames, tier {}",
            job.frames.len(),
            job.plan_tier.as_str()
        ));

        let safe_id = job.job_id.safe_name();
        let workspace = JobWorkspace::create(&self.config.work_dir, &safe_id)
            .map_err(|e| PipelineError::workspace(e.to_string()))?;

        let source = workspace.source_video();
        timed(logger, Step::DownloadVideo, async {
            self.backends
                .fetcher
                .fetch(&job.video_url, &source)
                .await
                .map_err(|e| PipelineError::download(e.to_string()))
        })
        .await?;

        let resolution = timed(logger, Step::ProbeResolution, async {
            Ok(self.probe_resolution(&source, logger).await)
        })
        .await?;

        let watermark_mode = self.resolve_watermark(job, &workspace, logger).await;
        metrics::record_watermark_mode(watermark_mode.as_str());

        let layout = self.layout.compute(&job.style, resolution);
        let subtitles = workspace.subtitles();
        let document = timed(logger, Step::BuildSubtitles, async {
            let document = SubtitleDocument::build(&job.frames, &job.style, &layout)
                .map_err(|e| PipelineError::subtitle(e.to_string()))?;
            document
                .write_to(&subtitles)
                .await
                .map_err(|e| PipelineError::subtitle(e.to_string()))?;
            Ok(document)
        })
        .await?;

        let extension = self.config.encoding.container.clone();
        let output = workspace.output(&extension);
        let (graph, command) = timed(logger, Step::BuildGraph, async {
            let image = (watermark_mode == WatermarkMode::Image).then(|| workspace.watermark_image());
            self.build_graph(&source, &subtitles, &output, watermark_mode, image, layout.scale)
        })
        .await?;

        timed(logger, Step::Encode, async {
            self.backends
                .encoder
                .encode(&command)
                .await
                .map_err(|e| PipelineError::encode(e, self.config.max_diagnostic_bytes))
        })
        .await?;

        let artifact = timed(logger, Step::Upload, async {
            self.backends
                .store
                .publish(
                    &output,
                    &safe_id,
                    &extension,
                    self.config.encoding.content_type(),
                )
                .await
                .map_err(|e| PipelineError::upload(e.to_string()))
        })
        .await?;

        if let Some(url) = &job.callback_url {
            let start = Instant::now();
            let payload = CallbackPayload::success(
                &self.config.render_secret,
                job.job_id.as_str(),
                &artifact.url,
            );
            self.backends.notifier.notify(url.clone(), payload);
            metrics::record_step_duration(Step::Callback.as_str(), start.elapsed().as_secs_f64());
            logger.log_progress("callback dispatched");
        }

        logger.log_completion(&format!(
            "{} ({}x{}, watermark {})",
            artifact.key, resolution.width, resolution.height, watermark_mode
        ));

        Ok(RenderReport {
            job_id: job.job_id.to_string(),
            video_url: artifact.url,
            artifact_key: artifact.key,
            watermark_mode,
            resolution,
            subtitle_events: document.event_count(),
            graph_stages: graph.stages().len(),
        })
    }

    /// Probe the source; an unusable result falls back to 1920x1080.
    async fn probe_resolution(&self, source: &Path, logger: &JobLogger) -> VideoMetadata {
        match self.backends.prober.probe(source).await {
            Ok(info) if info.metadata().is_valid() => {
                debug!(
                    width = info.width,
                    height = info.height,
                    has_audio = info.has_audio,
                    codec = %info.codec,
                    "Probed source video"
                );
                if !info.has_audio {
                    logger.log_progress("source has no audio stream");
                }
                info.metadata()
            }
            Ok(info) => {
                logger.log_warning(&format!(
                    "probe reported {}x{}, using fallback resolution",
                    info.width, info.height
                ));
                metrics::record_degradation("probe");
                VideoMetadata::fallback()
            }
            Err(e) => {
                logger.log_warning(&format!("probe failed, using fallback resolution: {}", e));
                metrics::record_degradation("probe");
                VideoMetadata::fallback()
            }
        }
    }

    /// Fetch the watermark image when the tier needs one and pick the mode.
    async fn resolve_watermark(
        &self,
        job: &RenderJob,
        workspace: &JobWorkspace,
        logger: &JobLogger,
    ) -> WatermarkMode {
        if !job.plan_tier.requires_watermark() {
            return select_mode(job.plan_tier, AssetAvailability::NotProvided);
        }
        let availability = match &job.watermark_url {
            None => AssetAvailability::NotProvided,
            Some(WatermarkSource::Invalid(raw)) => {
                logger.log_warning(&format!(
                    "watermark url {:?} is not a usable http(s) url, using text watermark",
                    raw
                ));
                metrics::record_degradation("watermark");
                AssetAvailability::FetchFailed
            }
            Some(WatermarkSource::Valid(url)) => {
                let dest = workspace.watermark_image();
                let start = Instant::now();
                let availability = match self.backends.fetcher.fetch(url, &dest).await {
                    Ok(_) => AssetAvailability::Fetched,
                    Err(e) => {
                        logger.log_warning(&format!(
                            "watermark download failed, using text watermark: {}",
                            e
                        ));
                        metrics::record_degradation("watermark");
                        AssetAvailability::FetchFailed
                    }
                };
                let elapsed = start.elapsed();
                metrics::record_step_duration(
                    Step::DownloadWatermark.as_str(),
                    elapsed.as_secs_f64(),
                );
                logger.log_step(Step::DownloadWatermark.as_str(), elapsed.as_millis());
                availability
            }
        };
        select_mode(job.plan_tier, availability)
    }

    fn build_graph(
        &self,
        source: &Path,
        subtitles: &Path,
        output: &Path,
        mode: WatermarkMode,
        image: Option<PathBuf>,
        scale: f64,
    ) -> PipelineResult<(CompositionGraph, FfmpegCommand)> {
        let graph = GraphBuilder::new(source, subtitles)
            .fonts_dir(self.fonts.root().map(Path::to_path_buf))
            .watermark(mode, image, self.watermark.clone())
            .scale(scale)
            .build()
            .map_err(|e| PipelineError::graph(e.to_string()))?;
        let command = graph
            .to_command(output, &self.config.encoding)
            .map_err(|e| PipelineError::graph(e.to_string()))?;
        Ok((graph, command))
    }
}

/// Run one step, recording its duration and logging the outcome.
async fn timed<T, F>(logger: &JobLogger, step: Step, fut: F) -> PipelineResult<T>
where
    F: Future<Output = PipelineResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed();
    metrics::record_step_duration(step.as_str(), elapsed.as_secs_f64());
    match &result {
        Ok(_) => logger.log_step(step.as_str(), elapsed.as_millis()),
        Err(e) => logger.log_error(step.as_str(), &e.to_string()),
    }
    result
}
