//! Caption text sanitizing for ASS event payloads.

/// ASS hard line break.
pub const LINE_BREAK: &str = "\\N";

/// Make caption text safe to embed as an ASS event payload.
///
/// Trims the text, drops control characters (tabs become spaces), escapes
/// backslashes and then override-block braces, and finally turns every line
/// break (`\r\n`, `\r`, `\n`) into `\N`. Call once per event.
pub fn sanitize_caption(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len() + 8);
    let mut chars = trimmed.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(LINE_BREAK);
            }
            '\n' => out.push_str(LINE_BREAK),
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every brace must be preceded by an odd run of backslashes.
    fn has_unescaped_brace(s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        chars.iter().enumerate().any(|(i, c)| {
            if *c != '{' && *c != '}' {
                return false;
            }
            let run = chars[..i].iter().rev().take_while(|p| **p == '\\').count();
            run % 2 == 0
        })
    }

    #[test]
    fn test_trims_and_passes_plain_text() {
        assert_eq!(sanitize_caption("  Hello world  "), "Hello world");
    }

    #[test]
    fn test_escapes_markup() {
        assert_eq!(sanitize_caption(r"{\b1}bold"), r"\{\\b1\}bold");
        assert!(!has_unescaped_brace(&sanitize_caption(r"a{b}c\{d\}")));
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(sanitize_caption("one\ntwo"), r"one\Ntwo");
        assert_eq!(sanitize_caption("one\r\ntwo\rthree"), r"one\Ntwo\Nthree");
    }

    #[test]
    fn test_mixed_payload_keeps_newline_positions() {
        let out = sanitize_caption("a{x}\nb\\c\n}");
        assert_eq!(out, r"a\{x\}\Nb\\c\N\}");
        assert!(!has_unescaped_brace(&out));
        assert_eq!(out.matches(LINE_BREAK).count(), 2);
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize_caption("a\u{0007}b\u{001b}c\td"), "abc d");
    }
}
