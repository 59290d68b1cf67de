//! CSS color tokens to ASS color encoding.
//!
//! ASS stores colors as `&HAABBGGRR`: alpha first (`00` is opaque), then the
//! channels in blue-green-red order. Unparseable input resolves to opaque
//! white; this codec never fails.

/// Opaque white, returned for anything that cannot be parsed.
pub const ASS_WHITE: &str = "&H00FFFFFF";

/// Alpha byte for a half-transparent shadow.
pub const SHADOW_ALPHA: u8 = 0x80;

const NAMED_COLORS: &[(&str, &str)] = &[
    ("white", "#FFFFFF"),
    ("black", "#000000"),
    ("yellow", "#FFFF00"),
    ("gold", "#FFD700"),
    ("red", "#FF0000"),
    ("green", "#008000"),
    ("blue", "#0000FF"),
];

/// Convert a CSS color (`#RGB`, `#RRGGBB`, or a known name) to `&H00BBGGRR`.
pub fn css_to_ass(color: &str) -> String {
    css_to_ass_with_alpha(color, 0)
}

/// Same as [`css_to_ass`] with an explicit alpha byte (`0x00` opaque, `0xFF` invisible).
pub fn css_to_ass_with_alpha(color: &str, alpha: u8) -> String {
    let (r, g, b) = parse_css(color).unwrap_or((0xFF, 0xFF, 0xFF));
    format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, b, g, r)
}

/// Parse a CSS token into RGB channels.
pub fn parse_css(color: &str) -> Option<(u8, u8, u8)> {
    let token = color.trim();
    let hex = match NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
    {
        Some((_, hex)) => *hex,
        None => token,
    };

    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
