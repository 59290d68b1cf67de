//! Caption-to-overlay compiler and FFmpeg CLI wrapper.
//!
//! This crate provides:
//! - CSS color, caption text and timestamp codecs for ASS scripts
//! - Resolution-aware caption layout with pluggable scale policies
//! - ASS subtitle document building
//! - Watermark mode selection and the composition filter graph
//! - Type-safe FFmpeg command building with progress parsing from `-progress pipe:2`
//! - FFprobe probing, HTTP downloads, font indexing and per-job workspaces

pub mod color;
pub mod command;
pub mod download;
pub mod error;
pub mod filters;
pub mod fonts;
pub mod graph;
pub mod layout;
pub mod probe;
pub mod progress;
pub mod subtitle;
pub mod text;
pub mod time;
pub mod watermark;
pub mod workspace;

pub use color::{css_to_ass, css_to_ass_with_alpha};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use download::HttpFetcher;
pub use error::{MediaError, MediaResult};
pub use fonts::FontIndex;
pub use graph::{CompositionGraph, GraphBuilder, Pad, Stage, OUTPUT_LABEL};
pub use layout::{
    policy_from_name, DampedSqrtScale, Layout, LayoutCalculator, LinePositions, LinearScale,
    ScalePolicy,
};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use subtitle::{SubtitleDocument, SubtitleEvent, STYLE_BOTTOM, STYLE_TOP};
pub use text::sanitize_caption;
pub use time::{format_timestamp, parse_timestamp};
pub use watermark::{select_mode, AssetAvailability, WatermarkConfig, WatermarkMode};
pub use workspace::JobWorkspace;
