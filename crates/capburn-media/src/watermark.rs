//! Watermark strategy for plans that require branding.
//!
//! - `select_mode`: decides between no watermark, the image asset, or a text fallback
//! - `WatermarkConfig`: placement, size and text settings (builder pattern)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use capburn_models::PlanTier;

/// Default watermark text when no image asset can be used.
pub const DEFAULT_WATERMARK_TEXT: &str = "capburn";

/// Default fontconfig family for the text watermark.
pub const DEFAULT_WATERMARK_FONT: &str = "Lexend";

/// How the watermark is rendered for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkMode {
    None,
    Image,
    Text,
}

impl WatermarkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkMode::None => "none",
            WatermarkMode::Image => "image",
            WatermarkMode::Text => "text",
        }
    }
}

impl fmt::Display for WatermarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of the watermark image asset for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetAvailability {
    /// The request carried no watermark URL
    NotProvided,
    /// The asset was downloaded into the job workspace
    Fetched,
    /// The download was attempted and failed
    FetchFailed,
}

/// Pick the watermark mode. The tier is checked first; the asset only matters
/// when the tier requires a watermark.
pub fn select_mode(tier: PlanTier, asset: AssetAvailability) -> WatermarkMode {
    if !tier.requires_watermark() {
        return WatermarkMode::None;
    }
    match asset {
        AssetAvailability::Fetched => WatermarkMode::Image,
        AssetAvailability::NotProvided | AssetAvailability::FetchFailed => WatermarkMode::Text,
    }
}

/// Configuration for the watermark layer.
///
/// ```ignore
/// let config = WatermarkConfig::default()
///     .with_offset(30, 30)
///     .with_opacity(0.8);
/// ```
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    /// Horizontal offset from right edge at 1080p (pixels)
    pub offset_x: u32,
    /// Vertical offset from bottom edge at 1080p (pixels)
    pub offset_y: u32,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Rendered image height at 1080p (pixels)
    pub display_height: u32,
    /// Text used in [`WatermarkMode::Text`]
    pub text: String,
    /// Font family for the text watermark
    pub font_family: String,
    /// Text size at 1080p (pixels)
    pub font_size: u32,
    /// Resolved font file for `font_family`, if one was found
    pub font_file: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            offset_x: 20,
            offset_y: 20,
            opacity: 0.7,
            display_height: 64,
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            font_family: DEFAULT_WATERMARK_FONT.to_string(),
            font_size: 36,
            font_file: None,
        }
    }
}

impl WatermarkConfig {
    /// Set offset from bottom-right corner.
    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    /// Set watermark opacity (0.0 = invisible, 1.0 = fully opaque).
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_display_height(mut self, height: u32) -> Self {
        self.display_height = height.max(1);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.text = text;
        }
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, file: Option<PathBuf>) -> Self {
        let family = family.into();
        if !family.trim().is_empty() {
            self.font_family = family;
        }
        self.font_file = file;
        self
    }

    pub fn font_file(&self) -> Option<&Path> {
        self.font_file.as_deref()
    }

    /// Pixel sizes for a video with the given layout scale.
    pub fn scaled(&self, scale: f64) -> ScaledWatermark {
        let px = |v: u32| ((v as f64) * scale).round().max(0.0) as u32;
        ScaledWatermark {
            offset_x: px(self.offset_x),
            offset_y: px(self.offset_y),
            display_height: px(self.display_height).max(1),
            font_size: px(self.font_size).max(1),
        }
    }
}

/// [`WatermarkConfig`] sizes resolved for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledWatermark {
    pub offset_x: u32,
    pub offset_y: u32,
    pub display_height: u32,
    pub font_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_table() {
        use AssetAvailability::*;
        let cases = [
            (PlanTier::Free, Fetched, WatermarkMode::Image),
            (PlanTier::Free, NotProvided, WatermarkMode::Text),
            (PlanTier::Free, FetchFailed, WatermarkMode::Text),
            (PlanTier::Trial, Fetched, WatermarkMode::Image),
            (PlanTier::Trial, FetchFailed, WatermarkMode::Text),
            (PlanTier::Paid, Fetched, WatermarkMode::None),
            (PlanTier::Paid, NotProvided, WatermarkMode::None),
            (PlanTier::Pro, FetchFailed, WatermarkMode::None),
            (PlanTier::Studio, Fetched, WatermarkMode::None),
        ];
        for (tier, asset, expected) in cases {
            assert_eq!(select_mode(tier, asset), expected, "{:?} {:?}", tier, asset);
        }
    }

    #[test]
    fn test_config_default() {
        let config = WatermarkConfig::default();
        assert_eq!(config.offset_x, 20);
        assert_eq!(config.offset_y, 20);
        assert!((config.opacity - 0.7).abs() < 0.01);
        assert_eq!(config.text, DEFAULT_WATERMARK_TEXT);
        assert!(config.font_file().is_none());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = WatermarkConfig::default()
            .with_offset(30, 40)
            .with_opacity(0.9)
            .with_text("  ")
            .with_font("Inter", Some(PathBuf::from("/fonts/Inter.ttf")));

        assert_eq!(config.offset_x, 30);
        assert_eq!(config.offset_y, 40);
        assert!((config.opacity - 0.9).abs() < 0.01);
        assert_eq!(config.text, DEFAULT_WATERMARK_TEXT);
        assert_eq!(config.font_family, "Inter");
        assert_eq!(config.font_file(), Some(Path::new("/fonts/Inter.ttf")));
    }

    #[test]
    fn test_opacity_clamping() {
        let config = WatermarkConfig::default().with_opacity(1.5);
        assert!((config.opacity - 1.0).abs() < 0.01);

        let config = WatermarkConfig::default().with_opacity(-0.5);
        assert!((config.opacity - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_scaled_sizes() {
        let scaled = WatermarkConfig::default().scaled(2.0);
        assert_eq!(scaled.offset_x, 40);
        assert_eq!(scaled.display_height, 128);
        assert_eq!(scaled.font_size, 72);

        let tiny = WatermarkConfig::default().scaled(0.001);
        assert_eq!(tiny.display_height, 1);
        assert_eq!(tiny.font_size, 1);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&WatermarkMode::Text).unwrap(), "\"text\"");
        assert_eq!(WatermarkMode::Image.to_string(), "image");
    }
}
