//! Caption layout in the video's pixel space.
//!
//! Style values are authored against a 1080 px tall canvas. A [`ScalePolicy`]
//! turns the real video height into a scale factor; font sizes, padding and
//! spacing are multiplied by it. Both caption lines are anchored bottom-center
//! (`\an2`), so a line's Y is the bottom edge of its text.

use std::fmt;
use std::sync::Arc;

use capburn_models::{ResolvedStyle, VideoMetadata, REFERENCE_HEIGHT};

/// Smallest rendered font size in pixels.
pub const FONT_SIZE_MIN: f64 = 16.0;
/// Largest rendered font size in pixels.
pub const FONT_SIZE_MAX: f64 = 320.0;
/// Gap between the top and bottom line, in reference pixels.
pub const LINE_GAP: f64 = 12.0;
/// Extra downward shift of the bottom line when both lines are shown.
pub const STACK_NUDGE: f64 = 24.0;

/// Maps a video height to a style scale factor.
pub trait ScalePolicy: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Scale factor for a video of the given height. Must be non-decreasing in height.
    fn scale(&self, video_height: u32) -> f64;
}

/// `height / 1080`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScale;

impl ScalePolicy for LinearScale {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn scale(&self, video_height: u32) -> f64 {
        video_height as f64 / REFERENCE_HEIGHT as f64
    }
}

/// `sqrt(height / 360)`, which grows more slowly on tall videos.
#[derive(Debug, Clone, Copy, Default)]
pub struct DampedSqrtScale;

impl ScalePolicy for DampedSqrtScale {
    fn name(&self) -> &'static str {
        "sqrt"
    }

    fn scale(&self, video_height: u32) -> f64 {
        (video_height as f64 / 360.0).sqrt()
    }
}

impl ScalePolicy for fn(u32) -> f64 {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn scale(&self, video_height: u32) -> f64 {
        self(video_height)
    }
}

/// Look up a shipped policy by name (`linear`, `sqrt`). Unknown names get linear.
pub fn policy_from_name(name: &str) -> Arc<dyn ScalePolicy> {
    match name.trim().to_ascii_lowercase().as_str() {
        "sqrt" | "damped" | "damped_sqrt" => Arc::new(DampedSqrtScale),
        _ => Arc::new(LinearScale),
    }
}

/// Concrete sizes for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub top_font_size: u32,
    pub bottom_font_size: u32,
    /// Bottom padding in video pixels
    pub padding: f64,
    pub center_x: u32,
}

/// Anchor points for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePositions {
    pub center_x: u32,
    pub top_y: u32,
    pub bottom_y: u32,
}

impl Layout {
    /// Anchors for a frame; `stacked` is true when both lines are shown.
    pub fn positions(&self, stacked: bool) -> LinePositions {
        let height = self.height as f64;

        let mut bottom_y = (height - self.padding).round().clamp(1.0, height.max(1.0));
        if stacked {
            bottom_y = (bottom_y + (STACK_NUDGE * self.scale).round()).min(height);
        }

        let gap = (LINE_GAP * self.scale).round();
        let top_y = (bottom_y - self.bottom_font_size as f64 - gap).max(0.0);

        LinePositions {
            center_x: self.center_x,
            top_y: top_y as u32,
            bottom_y: bottom_y as u32,
        }
    }
}

/// Computes [`Layout`]s with a configured scale policy.
#[derive(Clone)]
pub struct LayoutCalculator {
    policy: Arc<dyn ScalePolicy>,
}

impl fmt::Debug for LayoutCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCalculator")
            .field("policy", &self.policy.name())
            .finish()
    }
}

impl Default for LayoutCalculator {
    fn default() -> Self {
        Self::new(Arc::new(LinearScale))
    }
}

impl LayoutCalculator {
    pub fn new(policy: Arc<dyn ScalePolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn compute(&self, style: &ResolvedStyle, video: VideoMetadata) -> Layout {
        let video = video.or_fallback();
        let scale = self.policy.scale(video.height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        Layout {
            width: video.width,
            height: video.height,
            scale,
            top_font_size: scaled_font(style.top.font_size, scale),
            bottom_font_size: scaled_font(style.bottom.font_size, scale),
            padding: style.padding_bottom * scale,
            center_x: video.width / 2,
        }
    }
}

fn scaled_font(size: f64, scale: f64) -> u32 {
    (size * scale).clamp(FONT_SIZE_MIN, FONT_SIZE_MAX).round() as u32
}
