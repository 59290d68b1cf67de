//! Composition graph for the burn-in encode.
//!
//! Input 0 is always the source video. Input 1 exists only in image
//! watermark mode. Stages are emitted in order and the last one writes
//! [`OUTPUT_LABEL`], which is mapped as the only video output.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use capburn_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{
    filter_drawtext, filter_overlay_bottom_right, filter_subtitles, filter_watermark_scale,
    DrawtextFont,
};
use crate::watermark::{WatermarkConfig, WatermarkMode};

/// Label of the final video stream.
pub const OUTPUT_LABEL: &str = "vout";

/// Index of the source video input.
pub const VIDEO_INPUT: usize = 0;
/// Index of the watermark image input, when present.
pub const WATERMARK_INPUT: usize = 1;

/// A stream reference in the filter graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pad {
    /// Video stream of a declared input (`[N:v]`)
    Input(usize),
    /// Label produced by a stage (`[name]`)
    Label(String),
}

impl Pad {
    pub fn label(name: &str) -> Self {
        Pad::Label(name.to_string())
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Input(index) => write!(f, "[{}:v]", index),
            Pad::Label(name) => write!(f, "[{}]", name),
        }
    }
}

/// Role of a declared input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Video,
    WatermarkImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphInput {
    pub role: InputRole,
    pub path: PathBuf,
}

/// One filter chain with labeled pads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub inputs: Vec<Pad>,
    pub filter: String,
    pub output: String,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{}", pad)?;
        }
        write!(f, "{}[{}]", self.filter, self.output)
    }
}

/// Validated inputs and stages for one encode.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionGraph {
    inputs: Vec<GraphInput>,
    stages: Vec<Stage>,
    watermark_mode: WatermarkMode,
}

impl CompositionGraph {
    pub fn inputs(&self) -> &[GraphInput] {
        &self.inputs
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn watermark_mode(&self) -> WatermarkMode {
        self.watermark_mode
    }

    /// Check the pad invariant: every consumed pad is a declared input or the
    /// output of an earlier stage, labels are unique, and the graph ends in
    /// exactly one unconsumed label, [`OUTPUT_LABEL`].
    pub fn validate(&self) -> MediaResult<()> {
        if self.inputs.first().map(|i| i.role) != Some(InputRole::Video) {
            return Err(MediaError::invalid_graph("input 0 must be the source video"));
        }

        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        for stage in &self.stages {
            for pad in &stage.inputs {
                match pad {
                    Pad::Input(index) if *index < self.inputs.len() => {}
                    Pad::Input(index) => {
                        return Err(MediaError::invalid_graph(format!(
                            "stage '{}' reads undeclared input {}",
                            stage.name, index
                        )));
                    }
                    Pad::Label(name) if produced.contains(name.as_str()) => {
                        if !consumed.insert(name.as_str()) {
                            return Err(MediaError::invalid_graph(format!(
                                "label '{}' consumed twice",
                                name
                            )));
                        }
                    }
                    Pad::Label(name) => {
                        return Err(MediaError::invalid_graph(format!(
                            "stage '{}' reads '{}' before it is produced",
                            stage.name, name
                        )));
                    }
                }
            }
            if !produced.insert(stage.output.as_str()) {
                return Err(MediaError::invalid_graph(format!(
                    "label '{}' produced twice",
                    stage.output
                )));
            }
        }

        let dangling: Vec<&str> = produced.difference(&consumed).copied().collect();
        if dangling != [OUTPUT_LABEL] {
            return Err(MediaError::invalid_graph(format!(
                "expected single output '{}', found {:?}",
                OUTPUT_LABEL, dangling
            )));
        }
        Ok(())
    }

    /// The `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.stages
            .iter()
            .map(Stage::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Full ffmpeg invocation writing `output` with `encoding`.
    pub fn to_command(&self, output: &Path, encoding: &EncodingConfig) -> MediaResult<FfmpegCommand> {
        self.validate()?;

        let mut cmd = FfmpegCommand::new(output);
        for input in &self.inputs {
            cmd = cmd.input(&input.path);
        }

        Ok(cmd
            .filter_complex(self.to_filter_complex())
            .map_stream(format!("[{}]", OUTPUT_LABEL))
            .map_stream(format!("{}:a?", VIDEO_INPUT))
            .output_args(encoding.to_ffmpeg_args()))
    }
}

/// Builder for [`CompositionGraph`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    video: PathBuf,
    subtitles: PathBuf,
    fonts_dir: Option<PathBuf>,
    watermark_mode: WatermarkMode,
    watermark_image: Option<PathBuf>,
    watermark: WatermarkConfig,
    scale: f64,
}

impl GraphBuilder {
    pub fn new(video: impl AsRef<Path>, subtitles: impl AsRef<Path>) -> Self {
        Self {
            video: video.as_ref().to_path_buf(),
            subtitles: subtitles.as_ref().to_path_buf(),
            fonts_dir: None,
            watermark_mode: WatermarkMode::None,
            watermark_image: None,
            watermark: WatermarkConfig::default(),
            scale: 1.0,
        }
    }

    pub fn fonts_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.fonts_dir = dir;
        self
    }

    /// Set the watermark layer. `image` is required in [`WatermarkMode::Image`].
    pub fn watermark(
        mut self,
        mode: WatermarkMode,
        image: Option<PathBuf>,
        config: WatermarkConfig,
    ) -> Self {
        self.watermark_mode = mode;
        self.watermark_image = image;
        self.watermark = config;
        self
    }

    /// Layout scale applied to watermark sizes.
    pub fn scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    pub fn build(self) -> MediaResult<CompositionGraph> {
        let mut inputs = vec![GraphInput {
            role: InputRole::Video,
            path: self.video,
        }];
        let mut stages = Vec::with_capacity(3);
        let sized = self.watermark.scaled(self.scale);

        let subtitle_source = match self.watermark_mode {
            WatermarkMode::None => Pad::Input(VIDEO_INPUT),
            WatermarkMode::Image => {
                let image = self.watermark_image.ok_or_else(|| {
                    MediaError::invalid_graph("image watermark mode without an image")
                })?;
                inputs.push(GraphInput {
                    role: InputRole::WatermarkImage,
                    path: image,
                });
                stages.push(Stage {
                    name: "wm_scale",
                    inputs: vec![Pad::Input(WATERMARK_INPUT)],
                    filter: filter_watermark_scale(sized.display_height, self.watermark.opacity),
                    output: "wm".to_string(),
                });
                stages.push(Stage {
                    name: "wm_overlay",
                    inputs: vec![Pad::Input(VIDEO_INPUT), Pad::label("wm")],
                    filter: filter_overlay_bottom_right(sized.offset_x, sized.offset_y),
                    output: "wmv".to_string(),
                });
                Pad::label("wmv")
            }
            WatermarkMode::Text => {
                let font = match self.watermark.font_file() {
                    Some(path) => DrawtextFont::File(path),
                    None => DrawtextFont::Family(&self.watermark.font_family),
                };
                stages.push(Stage {
                    name: "wm_text",
                    inputs: vec![Pad::Input(VIDEO_INPUT)],
                    filter: filter_drawtext(
                        &self.watermark.text,
                        font,
                        sized.font_size,
                        self.watermark.opacity,
                        sized.offset_x,
                        sized.offset_y,
                    ),
                    output: "wmv".to_string(),
                });
                Pad::label("wmv")
            }
        };

        stages.push(Stage {
            name: "subtitles",
            inputs: vec![subtitle_source],
            filter: filter_subtitles(&self.subtitles, self.fonts_dir.as_deref()),
            output: OUTPUT_LABEL.to_string(),
        });

        let graph = CompositionGraph {
            inputs,
            stages,
            watermark_mode: self.watermark_mode,
        };
        graph.validate()?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> GraphBuilder {
        GraphBuilder::new("/work/source.mp4", "/work/captions.ass").fonts_dir(Some(PathBuf::from("/fonts")))
    }

    fn names(graph: &CompositionGraph) -> Vec<&'static str> {
        graph.stages().iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_no_watermark_single_stage() {
        let graph = builder().build().unwrap();
        assert_eq!(graph.inputs().len(), 1);
        assert_eq!(names(&graph), vec!["subtitles"]);
        assert_eq!(
            graph.to_filter_complex(),
            "[0:v]subtitles=filename='/work/captions.ass':fontsdir='/fonts'[vout]"
        );
    }

    #[test]
    fn test_image_watermark_input_mapping() {
        let graph = builder()
            .watermark(
                WatermarkMode::Image,
                Some(PathBuf::from("/work/wm.png")),
                WatermarkConfig::default(),
            )
            .build()
            .unwrap();

        assert_eq!(graph.inputs()[VIDEO_INPUT].role, InputRole::Video);
        assert_eq!(graph.inputs()[WATERMARK_INPUT].role, InputRole::WatermarkImage);
        assert_eq!(graph.inputs()[WATERMARK_INPUT].path, PathBuf::from("/work/wm.png"));
        assert_eq!(names(&graph), vec!["wm_scale", "wm_overlay", "subtitles"]);

        let fc = graph.to_filter_complex();
        assert_eq!(
            fc,
            "[1:v]scale=-1:64,format=rgba,colorchannelmixer=aa=0.70[wm];\
             [0:v][wm]overlay=W-w-20:H-h-20:format=auto[wmv];\
             [wmv]subtitles=filename='/work/captions.ass':fontsdir='/fonts'[vout]"
        );
    }

    #[test]
    fn test_text_watermark_uses_video_input() {
        let config = WatermarkConfig::default()
            .with_font("Lexend", Some(PathBuf::from("/fonts/Lexend-Bold.ttf")));
        let graph = builder()
            .watermark(WatermarkMode::Text, None, config)
            .scale(2.0)
            .build()
            .unwrap();

        assert_eq!(graph.inputs().len(), 1);
        assert_eq!(names(&graph), vec!["wm_text", "subtitles"]);
        let text = &graph.stages()[0];
        assert_eq!(text.inputs, vec![Pad::Input(0)]);
        assert!(text.filter.contains("fontfile='/fonts/Lexend-Bold.ttf'"));
        assert!(text.filter.contains("fontsize=72"));
        assert_eq!(graph.stages()[1].inputs, vec![Pad::label("wmv")]);
    }

    #[test]
    fn test_text_watermark_font_fallback() {
        let graph = builder()
            .watermark(WatermarkMode::Text, None, WatermarkConfig::default())
            .build()
            .unwrap();
        assert!(graph.stages()[0].filter.starts_with("drawtext=font='Lexend':"));
    }

    #[test]
    fn test_image_mode_requires_image() {
        let err = builder()
            .watermark(WatermarkMode::Image, None, WatermarkConfig::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidGraph(_)));
    }

    #[test]
    fn test_validate_rejects_forward_reference() {
        let mut graph = builder().build().unwrap();
        graph.stages.insert(
            0,
            Stage {
                name: "bad",
                inputs: vec![Pad::label("later")],
                filter: "null".into(),
                output: "x".into(),
            },
        );
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_undeclared_input() {
        let mut graph = builder().build().unwrap();
        graph.stages[0].inputs = vec![Pad::Input(1)];
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_label() {
        let graph = builder()
            .watermark(WatermarkMode::Text, None, WatermarkConfig::default())
            .build()
            .unwrap();
        let mut broken = graph.clone();
        broken.stages[1].inputs = vec![Pad::Input(0)];
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_command_arguments() {
        let graph = builder().build().unwrap();
        let args = graph
            .to_command(Path::new("/work/out.mp4"), &EncodingConfig::default())
            .unwrap()
            .build_args();

        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert_eq!(args[pos("-i") + 1], "/work/source.mp4");
        assert_eq!(args[pos("-map") + 1], "[vout]");
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "0:a?"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "copy"));
        assert!(pos("-filter_complex") > pos("-i"));
        assert_eq!(args.last().map(String::as_str), Some("/work/out.mp4"));
    }

    #[test]
    fn test_command_inputs_in_order() {
        let graph = builder()
            .watermark(
                WatermarkMode::Image,
                Some(PathBuf::from("/work/wm.png")),
                WatermarkConfig::default(),
            )
            .build()
            .unwrap();
        let args = graph
            .to_command(Path::new("/work/out.mp4"), &EncodingConfig::default())
            .unwrap()
            .build_args();
        let inputs: Vec<_> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(inputs, vec!["/work/source.mp4", "/work/wm.png"]);
    }
}
