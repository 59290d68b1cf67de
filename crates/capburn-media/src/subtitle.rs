//! ASS subtitle document builder.
//!
//! A [`SubtitleDocument`] carries the canvas header, a `Top` and a `Bottom`
//! style record and the timed dialogue events. Every event is positioned
//! explicitly with `{\an2\pos(x,y)}`, so the style margins stay at zero.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, warn};

use capburn_models::{CaptionFrame, LineStyle, ResolvedStyle};

use crate::color::{css_to_ass, css_to_ass_with_alpha, SHADOW_ALPHA};
use crate::error::{MediaError, MediaResult};
use crate::layout::Layout;
use crate::text::sanitize_caption;
use crate::time::{format_centis, ms_to_seconds, seconds_to_centis};

/// Style used for `line1`.
pub const STYLE_TOP: &str = "Top";
/// Style used for `line2`.
pub const STYLE_BOTTOM: &str = "Bottom";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

const SECONDARY_COLOUR: &str = "&H000000FF";
const OUTLINE_COLOUR: &str = "&H00000000";
const SHADOW_BASE: &str = "#000000";
const BORDER_STYLE: u8 = 1;
const OUTLINE_WIDTH: u8 = 2;
const SHADOW_DEPTH: u8 = 2;
const ALIGN_BOTTOM_CENTER: u8 = 2;
const ENCODING_DEFAULT: u8 = 1;

/// One `Style:` line.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRecord {
    pub name: String,
    pub font_family: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub back_colour: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyleRecord {
    pub fn from_line_style(name: &str, style: &LineStyle, font_size: u32) -> Self {
        Self {
            name: name.to_string(),
            font_family: style.font_family.clone(),
            font_size,
            primary_colour: css_to_ass(&style.color),
            back_colour: css_to_ass_with_alpha(SHADOW_BASE, SHADOW_ALPHA),
            bold: style.bold,
            italic: style.italic,
        }
    }

    fn write_line(&self, out: &mut String) {
        let _ = writeln!(
            out,
            "Style: {},{},{},{},{},{},{},{},{},0,0,100,100,0,0,{},{},{},{},0,0,0,{}",
            self.name,
            self.font_family,
            self.font_size,
            self.primary_colour,
            SECONDARY_COLOUR,
            OUTLINE_COLOUR,
            self.back_colour,
            ass_bool(self.bold),
            ass_bool(self.italic),
            BORDER_STYLE,
            OUTLINE_WIDTH,
            SHADOW_DEPTH,
            ALIGN_BOTTOM_CENTER,
            ENCODING_DEFAULT,
        );
    }
}

/// One `Dialogue:` line. Times are in centiseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEvent {
    pub start_cs: u64,
    pub end_cs: u64,
    pub style: String,
    pub x: u32,
    pub y: u32,
    /// Already sanitized payload
    pub text: String,
}

impl SubtitleEvent {
    fn write_line(&self, out: &mut String) {
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},{},,0,0,0,,{{\\an{}\\pos({},{})}}{}",
            format_centis(self.start_cs),
            format_centis(self.end_cs),
            self.style,
            ALIGN_BOTTOM_CENTER,
            self.x,
            self.y,
            self.text,
        );
    }
}

/// A complete ASS script for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleDocument {
    play_res_x: u32,
    play_res_y: u32,
    styles: Vec<StyleRecord>,
    events: Vec<SubtitleEvent>,
}

impl SubtitleDocument {
    /// Compile caption frames into a document sized to `layout`.
    ///
    /// Frames keep their input order. Each non-blank line yields one event.
    pub fn build(
        frames: &[CaptionFrame],
        style: &ResolvedStyle,
        layout: &Layout,
    ) -> MediaResult<Self> {
        let styles = vec![
            StyleRecord::from_line_style(STYLE_TOP, &style.top, layout.top_font_size),
            StyleRecord::from_line_style(STYLE_BOTTOM, &style.bottom, layout.bottom_font_size),
        ];

        let mut events = Vec::with_capacity(frames.len() * 2);
        for (index, frame) in frames.iter().enumerate() {
            if frame.has_invalid_end() {
                warn!(
                    frame = index,
                    start_ms = frame.start_ms,
                    end_ms = ?frame.end_ms,
                    "Caption frame ends before it starts, using default duration"
                );
            }

            let start_cs = seconds_to_centis(ms_to_seconds(frame.start_ms));
            let mut end_cs = seconds_to_centis(ms_to_seconds(frame.effective_end_ms()));
            if end_cs <= start_cs {
                end_cs = start_cs + 1;
            }

            let top = frame.top_text().map(sanitize_caption).filter(|t| !t.is_empty());
            let bottom = frame
                .bottom_text()
                .map(sanitize_caption)
                .filter(|t| !t.is_empty());
            let positions = layout.positions(top.is_some() && bottom.is_some());

            if let Some(text) = top {
                events.push(SubtitleEvent {
                    start_cs,
                    end_cs,
                    style: STYLE_TOP.to_string(),
                    x: positions.center_x,
                    y: positions.top_y,
                    text,
                });
            }
            if let Some(text) = bottom {
                events.push(SubtitleEvent {
                    start_cs,
                    end_cs,
                    style: STYLE_BOTTOM.to_string(),
                    x: positions.center_x,
                    y: positions.bottom_y,
                    text,
                });
            }
        }

        let doc = Self {
            play_res_x: layout.width,
            play_res_y: layout.height,
            styles,
            events,
        };
        doc.validate()?;

        debug!(
            events = doc.events.len(),
            frames = frames.len(),
            resolution = %format!("{}x{}", doc.play_res_x, doc.play_res_y),
            "Built subtitle document"
        );
        Ok(doc)
    }

    /// Check that every event has positive duration and a declared style.
    pub fn validate(&self) -> MediaResult<()> {
        for style in &self.styles {
            if style.font_family.contains(',') || style.font_family.chars().any(char::is_control) {
                return Err(MediaError::subtitle(format!(
                    "style '{}' has a font name that would break the record",
                    style.name
                )));
            }
        }
        for (i, event) in self.events.iter().enumerate() {
            if event.start_cs >= event.end_cs {
                return Err(MediaError::subtitle(format!(
                    "event {} has non-positive duration",
                    i
                )));
            }
            if !self.styles.iter().any(|s| s.name == event.style) {
                return Err(MediaError::subtitle(format!(
                    "event {} references undefined style '{}'",
                    i, event.style
                )));
            }
        }
        Ok(())
    }

    pub fn styles(&self) -> &[StyleRecord] {
        &self.styles
    }

    pub fn events(&self) -> &[SubtitleEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Render the document as ASS text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(512 + self.events.len() * 96);

        out.push_str("[Script Info]\n");
        out.push_str("ScriptType: v4.00+\n");
        let _ = writeln!(out, "PlayResX: {}", self.play_res_x);
        let _ = writeln!(out, "PlayResY: {}", self.play_res_y);
        out.push_str("WrapStyle: 0\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
        out.push_str("YCbCr Matrix: None\n");

        out.push_str("\n[V4+ Styles]\n");
        out.push_str(STYLE_FORMAT);
        out.push('\n');
        for style in &self.styles {
            style.write_line(&mut out);
        }

        out.push_str("\n[Events]\n");
        out.push_str(EVENT_FORMAT);
        out.push('\n');
        for event in &self.events {
            event.write_line(&mut out);
        }

        out
    }

    /// Write the rendered script to `path`.
    pub async fn write_to(&self, path: &Path) -> MediaResult<()> {
        tokio::fs::write(path, self.render()).await?;
        debug!(path = %path.display(), "Wrote subtitle file");
        Ok(())
    }
}

fn ass_bool(flag: bool) -> i8 {
    if flag {
        -1
    } else {
        0
    }
}
