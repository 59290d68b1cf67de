//! Per-job scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::MediaResult;

/// Uniquely named directory holding one job's intermediate files.
///
/// The directory and everything in it is removed when the guard drops.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    /// Create `capburn-<safe_id>-XXXXXX` under `parent`, creating `parent` if needed.
    pub fn create(parent: &Path, safe_id: &str) -> MediaResult<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("capburn-{}-", safe_id))
            .rand_bytes(6)
            .tempdir_in(parent)?;
        debug!(dir = %dir.path().display(), "Created job workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_video(&self) -> PathBuf {
        self.dir.path().join("source.mp4")
    }

    pub fn watermark_image(&self) -> PathBuf {
        self.dir.path().join("watermark.png")
    }

    pub fn subtitles(&self) -> PathBuf {
        self.dir.path().join("captions.ass")
    }

    /// Encoded output named after the container extension.
    pub fn output(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("output.{}", extension))
    }
}
