//! Timed caption frames.

use serde::{Deserialize, Serialize};

/// Display duration applied when a frame carries no usable end time.
pub const DEFAULT_FRAME_DURATION_MS: u64 = 2000;

/// One timed caption frame with up to two lines.
///
/// `line1` renders with the top style, `line2` with the bottom style.
/// Frames keep the caller's order and may overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionFrame {
    /// Start offset in milliseconds
    #[serde(alias = "start", alias = "startMs", default)]
    pub start_ms: u64,
    /// End offset in milliseconds (defaults to start + 2s)
    #[serde(alias = "end", alias = "endMs", default)]
    pub end_ms: Option<u64>,
    /// Top line text
    #[serde(default)]
    pub line1: Option<String>,
    /// Bottom line text
    #[serde(default)]
    pub line2: Option<String>,
}

impl CaptionFrame {
    /// Create a frame with an explicit end time.
    pub fn new(
        start_ms: u64,
        end_ms: u64,
        line1: Option<&str>,
        line2: Option<&str>,
    ) -> Self {
        Self {
            start_ms,
            end_ms: Some(end_ms),
            line1: line1.map(str::to_string),
            line2: line2.map(str::to_string),
        }
    }

    /// Whether an explicit end time is present but not after the start.
    pub fn has_invalid_end(&self) -> bool {
        matches!(self.end_ms, Some(end) if end <= self.start_ms)
    }

    /// Effective end time in milliseconds.
    ///
    /// A missing end, or one that is not after the start, falls back to
    /// `start + DEFAULT_FRAME_DURATION_MS`.
    pub fn effective_end_ms(&self) -> u64 {
        match self.end_ms {
            Some(end) if end > self.start_ms => end,
            _ => self.start_ms.saturating_add(DEFAULT_FRAME_DURATION_MS),
        }
    }

    /// Top line, if it has visible content.
    pub fn top_text(&self) -> Option<&str> {
        non_blank(self.line1.as_deref())
    }

    /// Bottom line, if it has visible content.
    pub fn bottom_text(&self) -> Option<&str> {
        non_blank(self.line2.as_deref())
    }

    /// Whether both lines will be rendered for this frame.
    pub fn is_stacked(&self) -> bool {
        self.top_text().is_some() && self.bottom_text().is_some()
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}
