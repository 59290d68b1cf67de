//! FFmpeg filter expressions used by the composition graph.

use std::path::Path;

/// Escape a value for the filter option parser (`\`, `'` and `:`).
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Escape `drawtext` text for its expansion pass, then for the option parser.
pub fn escape_drawtext_text(text: &str) -> String {
    escape_filter_path(&text.replace('\\', "\\\\").replace('%', "\\%"))
}

/// Wrap an option-escaped value in graph-level quotes.
///
/// A backslash is literal inside quotes, so an embedded `'` closes the quote,
/// is escaped, and reopens it.
pub fn quote_filter_value(escaped: &str) -> String {
    format!("'{}'", escaped.replace('\'', r"'\''"))
}

fn quoted_path(path: &Path) -> String {
    quote_filter_value(&escape_filter_path(&path.to_string_lossy()))
}

/// Scale the watermark image to a fixed height and apply its opacity.
pub fn filter_watermark_scale(display_height: u32, opacity: f32) -> String {
    format!(
        "scale=-1:{},format=rgba,colorchannelmixer=aa={:.2}",
        display_height.max(1),
        opacity.clamp(0.0, 1.0)
    )
}

/// Overlay the second pad onto the first, anchored bottom-right.
pub fn filter_overlay_bottom_right(offset_x: u32, offset_y: u32) -> String {
    format!("overlay=W-w-{}:H-h-{}:format=auto", offset_x, offset_y)
}

/// Font source for `drawtext`.
#[derive(Debug, Clone, Copy)]
pub enum DrawtextFont<'a> {
    /// A font file on disk
    File(&'a Path),
    /// A fontconfig family name
    Family(&'a str),
}

/// Semi-transparent text anchored bottom-right.
pub fn filter_drawtext(
    text: &str,
    font: DrawtextFont<'_>,
    font_size: u32,
    opacity: f32,
    offset_x: u32,
    offset_y: u32,
) -> String {
    let font_opt = match font {
        DrawtextFont::File(path) => format!("fontfile={}", quoted_path(path)),
        DrawtextFont::Family(name) => {
            format!("font={}", quote_filter_value(&escape_filter_path(name)))
        }
    };
    format!(
        "drawtext={}:text={}:fontsize={}:fontcolor=white@{:.2}:\
         shadowcolor=black@{:.2}:shadowx=2:shadowy=2:x=w-tw-{}:y=h-th-{}",
        font_opt,
        quote_filter_value(&escape_drawtext_text(text)),
        font_size.max(1),
        opacity.clamp(0.0, 1.0),
        (opacity * 0.5).clamp(0.0, 1.0),
        offset_x,
        offset_y
    )
}

/// Burn an ASS script in with libass.
pub fn filter_subtitles(ass_path: &Path, fonts_dir: Option<&Path>) -> String {
    match fonts_dir {
        Some(dir) => format!(
            "subtitles=filename={}:fontsdir={}",
            quoted_path(ass_path),
            quoted_path(dir)
        ),
        None => format!("subtitles=filename={}", quoted_path(ass_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path("/tmp/a b.ass"), "/tmp/a b.ass");
        assert_eq!(escape_filter_path("C:\\x\\it's.ass"), "C\\:\\\\x\\\\it\\'s.ass");
    }

    #[test]
    fn test_watermark_scale() {
        assert_eq!(
            filter_watermark_scale(64, 0.7),
            "scale=-1:64,format=rgba,colorchannelmixer=aa=0.70"
        );
        assert!(filter_watermark_scale(0, 2.0).starts_with("scale=-1:1,"));
        assert!(filter_watermark_scale(10, 2.0).ends_with("aa=1.00"));
    }

    #[test]
    fn test_overlay() {
        assert_eq!(filter_overlay_bottom_right(20, 30), "overlay=W-w-20:H-h-30:format=auto");
    }

    #[test]
    fn test_drawtext_font_sources() {
        let file = filter_drawtext(
            "Made with capburn: 100%",
            DrawtextFont::File(Path::new("/fonts/Lexend.ttf")),
            36,
            0.6,
            20,
            20,
        );
        assert!(file.starts_with("drawtext=fontfile='/fonts/Lexend.ttf':"));
        assert!(file.contains(r"text='Made with capburn\: 100\\%'"));
        assert!(file.contains("fontcolor=white@0.60"));
        assert!(file.contains("x=w-tw-20:y=h-th-20"));

        let family = filter_drawtext("wm", DrawtextFont::Family("Lexend"), 36, 0.6, 20, 20);
        assert!(family.starts_with("drawtext=font='Lexend':"));
    }

    #[test]
    fn test_subtitles() {
        let f = filter_subtitles(Path::new("/work/job/captions.ass"), Some(Path::new("/fonts")));
        assert_eq!(f, "subtitles=filename='/work/job/captions.ass':fontsdir='/fonts'");
        let f = filter_subtitles(Path::new("/w/it's.ass"), None);
        assert_eq!(f, r"subtitles=filename='/w/it\'\''s.ass'");
        let f = filter_subtitles(Path::new("/w/a:b.ass"), None);
        assert_eq!(f, r"subtitles=filename='/w/a\:b.ass'");
    }

    #[test]
    fn test_quote_filter_value() {
        assert_eq!(quote_filter_value("plain"), "'plain'");
        assert_eq!(quote_filter_value(r"it\'s"), r"'it\'\''s'");
    }

    #[test]
    fn test_drawtext_escapes_expansion_characters() {
        assert_eq!(escape_drawtext_text("100%"), r"100\\%");
        assert_eq!(escape_drawtext_text(r"a\b"), r"a\\\\b");
    }
}
