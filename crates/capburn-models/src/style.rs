//! Caption style configuration.
//!
//! `StyleConfig` is the wire shape (every field optional). It is resolved
//! exactly once per job against a [`StyleDefaults`] table into a
//! [`ResolvedStyle`], so nothing downstream ever re-derives a default.

use serde::{Deserialize, Serialize};

/// Canvas height at which style pixel values are authored.
pub const REFERENCE_HEIGHT: u32 = 1080;

/// Font weight as sent by clients: either `"700"`/`"bold"` or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u32),
    Named(String),
}

impl FontWeight {
    /// Whether this weight maps to the subtitle engine's bold flag.
    pub fn is_bold(&self) -> bool {
        match self {
            FontWeight::Numeric(n) => *n >= 700,
            FontWeight::Named(s) => {
                let s = s.trim().to_ascii_lowercase();
                match s.parse::<u32>() {
                    Ok(n) => n >= 700,
                    Err(_) => matches!(s.as_str(), "bold" | "bolder" | "extrabold" | "black"),
                }
            }
        }
    }
}

/// Style options recognised on a render request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(default)]
    pub font_top: Option<String>,
    #[serde(default)]
    pub font_bottom: Option<String>,
    #[serde(default)]
    pub font_size_top: Option<f64>,
    #[serde(default)]
    pub font_size_bottom: Option<f64>,
    #[serde(default)]
    pub color_top: Option<String>,
    #[serde(default)]
    pub color_bottom: Option<String>,
    #[serde(default)]
    pub font_weight_top: Option<FontWeight>,
    #[serde(default)]
    pub font_weight_bottom: Option<FontWeight>,
    #[serde(default)]
    pub is_italic_top: Option<bool>,
    #[serde(default)]
    pub is_italic_bottom: Option<bool>,
    /// Distance of the bottom line from the bottom edge, in reference pixels
    #[serde(default)]
    pub padding_bottom: Option<f64>,
}

/// Default values for one caption line role.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDefaults {
    pub font_family: &'static str,
    pub font_size: f64,
    pub color: &'static str,
    pub bold: bool,
    pub italic: bool,
}

/// The single table of style defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub top: LineDefaults,
    pub bottom: LineDefaults,
    pub padding_bottom: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            top: LineDefaults {
                font_family: "Lexend",
                font_size: 64.0,
                color: "white",
                bold: false,
                italic: false,
            },
            bottom: LineDefaults {
                font_family: "Cormorant Garamond",
                font_size: 100.0,
                color: "gold",
                bold: false,
                italic: false,
            },
            padding_bottom: 150.0,
        }
    }
}

/// Fully resolved style for one caption line role.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub font_family: String,
    /// Font size in reference pixels (unscaled)
    pub font_size: f64,
    /// CSS color token, converted by the subtitle builder
    pub color: String,
    pub bold: bool,
    pub italic: bool,
}

/// Style with every option decided.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub top: LineStyle,
    pub bottom: LineStyle,
    /// Bottom padding in reference pixels (unscaled, never negative)
    pub padding_bottom: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        StyleConfig::default().resolve(&StyleDefaults::default())
    }
}

impl StyleConfig {
    /// Resolve against a defaults table.
    pub fn resolve(&self, defaults: &StyleDefaults) -> ResolvedStyle {
        ResolvedStyle {
            top: resolve_line(
                &defaults.top,
                self.font_top.as_deref(),
                self.font_size_top,
                self.color_top.as_deref(),
                self.font_weight_top.as_ref(),
                self.is_italic_top,
            ),
            bottom: resolve_line(
                &defaults.bottom,
                self.font_bottom.as_deref(),
                self.font_size_bottom,
                self.color_bottom.as_deref(),
                self.font_weight_bottom.as_ref(),
                self.is_italic_bottom,
            ),
            padding_bottom: self
                .padding_bottom
                .filter(|p| p.is_finite())
                .map(|p| p.max(0.0))
                .unwrap_or(defaults.padding_bottom),
        }
    }
}

fn resolve_line(
    defaults: &LineDefaults,
    font: Option<&str>,
    size: Option<f64>,
    color: Option<&str>,
    weight: Option<&FontWeight>,
    italic: Option<bool>,
) -> LineStyle {
    LineStyle {
        font_family: font
            .map(clean_font_name)
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| defaults.font_family.to_string()),
        font_size: size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(defaults.font_size),
        color: color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.color)
            .to_string(),
        bold: weight.map(FontWeight::is_bold).unwrap_or(defaults.bold),
        italic: italic.unwrap_or(defaults.italic),
    }
}

/// Font names land in a comma-separated `Style:` record, one per line.
fn clean_font_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
