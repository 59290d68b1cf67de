//! Video resolution metadata.

use serde::{Deserialize, Serialize};

/// Resolution assumed when the source cannot be probed.
pub const FALLBACK_WIDTH: u32 = 1920;
pub const FALLBACK_HEIGHT: u32 = 1080;

/// Pixel dimensions of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self::fallback()
    }
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The fixed 1920x1080 resolution used when probing fails.
    pub fn fallback() -> Self {
        Self {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
        }
    }

    /// Both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Keep valid dimensions, otherwise use the fallback.
    pub fn or_fallback(self) -> Self {
        if self.is_valid() {
            self
        } else {
            Self::fallback()
        }
    }
}

impl std::fmt::Display for VideoMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback() {
        assert_eq!(VideoMetadata::default(), VideoMetadata::new(1920, 1080));
        assert_eq!(VideoMetadata::new(0, 720).or_fallback(), VideoMetadata::fallback());
        assert_eq!(
            VideoMetadata::new(1080, 1920).or_fallback(),
            VideoMetadata::new(1080, 1920)
        );
        assert_eq!(VideoMetadata::new(1080, 1920).to_string(), "1080x1920");
    }
}
