//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Default cap on captured stderr kept for diagnostics.
pub const DEFAULT_MAX_DIAGNOSTIC_BYTES: usize = 2000;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file paths, in `-i` order
    inputs: Vec<PathBuf>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a command writing to `output`. Add inputs with [`FfmpegCommand::input`].
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append an input. Inputs are numbered in the order they are added.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map_stream(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and a bounded stderr tail.
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
    /// Cap on diagnostic bytes attached to errors
    max_diagnostic_bytes: usize,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            timeout_secs: None,
            max_diagnostic_bytes: DEFAULT_MAX_DIAGNOSTIC_BYTES,
        }
    }

    /// Set timeout. Zero disables it.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn with_max_diagnostic_bytes(mut self, max: usize) -> Self {
        self.max_diagnostic_bytes = max;
        self
    }

    /// Run an FFmpeg command, logging progress at debug level.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |p| {
            debug!(
                frame = p.frame,
                out_time_ms = p.out_time_ms,
                speed = p.speed,
                complete = p.is_complete,
                "FFmpeg progress"
            );
        })
        .await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let ffmpeg = check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stderr not captured", None, None))?;
        let max_bytes = self.max_diagnostic_bytes;
        let stderr_handle =
            tokio::spawn(async move { drain_stderr(stderr, max_bytes, progress_callback).await });

        let status = self.wait_for_completion(&mut child).await;
        let diagnostics = stderr_handle.await.unwrap_or_default();

        match status? {
            Some(0) => Ok(()),
            code => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!diagnostics.is_empty()).then_some(diagnostics),
                code,
            )),
        }
    }

    /// Wait for the child, killing it on timeout. Returns the exit code.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<Option<i32>> {
        let status = match self.timeout_secs {
            Some(timeout_secs) => {
                match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        return Err(MediaError::Timeout(timeout_secs));
                    }
                }
            }
            None => child.wait().await?,
        };
        Ok(status.code())
    }
}

/// Read stderr to EOF, feeding progress lines to the callback and keeping
/// everything else as a bounded diagnostics tail.
///
/// Lines are split on raw bytes so invalid UTF-8 never stops the drain.
async fn drain_stderr<R, F>(stderr: R, max_bytes: usize, progress_callback: F) -> String
where
    R: AsyncRead + Unpin,
    F: Fn(FfmpegProgress),
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut current = FfmpegProgress::default();
    let mut tail = StderrTail::new(max_bytes);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Stopped reading FFmpeg stderr: {}", e);
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if is_progress_line(line) {
            if let Some(progress) = parse_progress_line(line, &mut current) {
                progress_callback(progress);
            }
        } else {
            tail.push(line);
        }
    }
    tail.into_string()
}

/// Keeps the last `max` bytes of stderr output.
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
    max: usize,
}

impl StderrTail {
    fn new(max: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            max,
        }
    }

    fn push(&mut self, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        self.bytes += line.len() + 1;
        self.lines.push_back(line.to_string());
        while self.bytes > self.max {
            match self.lines.pop_front() {
                Some(old) => self.bytes -= old.len() + 1,
                None => break,
            }
        }
        if self.lines.is_empty() && self.max > 0 {
            // A single line longer than the cap: keep its end
            let kept = truncate_tail(line, self.max.saturating_sub(1));
            self.bytes = kept.len() + 1;
            self.lines.push_back(kept.to_string());
        }
    }

    fn into_string(self) -> String {
        self.lines.into_iter().collect::<Vec<_>>().join("\n")
    }
}

/// Last at most `max` bytes of `s`, cut on a char boundary.
pub fn truncate_tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Whether a stderr line belongs to `-progress` output (`key=value`).
fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, value)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                && !value.contains(' ')
        }
        None => false,
    }
}

/// Parse a progress line from FFmpeg's -progress output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys carry microseconds
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "out_time" => {
                current.out_time = value.to_string();
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    current.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("output.mp4")
            .input("input.mp4")
            .input("wm.png")
            .filter_complex("[0:v]null[vout]")
            .map_stream("[vout]");

        let args = cmd.build_args();
        assert_eq!(&args[..2], &["-y".to_string(), "-v".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "-progress" && w[1] == "pipe:2"));
        let inputs: Vec<_> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].clone())
            .collect();
        assert_eq!(inputs, vec!["input.mp4", "wm.png"]);
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        parse_progress_line("out_time_us=5000000", &mut progress);
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        let result = parse_progress_line("progress=end", &mut progress);
        assert!(result.is_some());
        assert!(progress.is_complete);
    }

    #[test]
    fn test_progress_line_detection() {
        assert!(is_progress_line("frame=120"));
        assert!(is_progress_line("stream_0_0_q=23.0"));
        assert!(is_progress_line("progress=continue"));
        assert!(!is_progress_line("[Parsed_subtitles_1 @ 0x55] Unable to open /x.ass"));
        assert!(!is_progress_line("Error opening input file"));
        assert!(!is_progress_line("Option key=value not found"));
    }

    #[test]
    fn test_stderr_tail_is_bounded() {
        let mut tail = StderrTail::new(32);
        for i in 0..50 {
            tail.push(&format!("error line {}", i));
        }
        let out = tail.into_string();
        assert!(out.len() <= 32, "{}", out.len());
        assert!(out.ends_with("error line 49"));
    }

    #[test]
    fn test_stderr_tail_single_long_line() {
        let mut tail = StderrTail::new(10);
        tail.push(&"x".repeat(100));
        let out = tail.into_string();
        assert!(!out.is_empty());
        assert!(out.len() <= 10);
    }

    #[test]
    fn test_truncate_tail_char_boundary() {
        assert_eq!(truncate_tail("hello", 10), "hello");
        assert_eq!(truncate_tail("hello", 3), "llo");
        let s = "aé€";
        let t = truncate_tail(s, 4);
        assert!(t.len() <= 4);
        assert!(s.ends_with(t));
    }

    #[tokio::test]
    async fn test_drain_stderr_survives_invalid_utf8() {
        let input: &[u8] = b"frame=1\n\xff\xfe broken encoder name\nprogress=continue\n\
            Error opening filters!\nprogress=end\n";
        let seen = std::sync::Arc::new(std::sync::Mutex::new(0usize));
        let counter = seen.clone();

        let tail = drain_stderr(input, 2000, move |_| *counter.lock().unwrap() += 1).await;

        assert!(tail.contains("broken encoder name"));
        assert!(tail.ends_with("Error opening filters!"));
        assert!(*seen.lock().unwrap() >= 1);
    }

    #[test]
    fn test_zero_timeout_disables() {
        assert!(FfmpegRunner::new().with_timeout(0).timeout_secs.is_none());
        assert_eq!(FfmpegRunner::new().with_timeout(5).timeout_secs, Some(5));
    }
}
