//! ASS timestamp codec (`H:MM:SS.cc`).

/// Convert a millisecond offset to fractional seconds.
pub fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Round fractional seconds to whole centiseconds. Non-finite or negative input is 0.
pub fn seconds_to_centis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 100.0).round() as u64
}

/// Format fractional seconds as `H:MM:SS.cc`.
pub fn format_timestamp(seconds: f64) -> String {
    format_centis(seconds_to_centis(seconds))
}

/// Format a centisecond count as `H:MM:SS.cc`.
pub fn format_centis(total: u64) -> String {
    let hours = total / 360_000;
    let minutes = (total / 6_000) % 60;
    let secs = (total / 100) % 60;
    let centis = total % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

/// Parse `H:MM:SS.cc` back into seconds.
pub fn parse_timestamp(s: &str) -> Option<f64> {
    let mut parts = s.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes = two_digits(parts.next()?)?;
    let (secs, centis) = parts.next()?.split_once('.')?;
    if parts.next().is_some() {
        return None;
    }
    let secs = two_digits(secs)?;
    let centis = two_digits(centis)?;
    if minutes >= 60 || secs >= 60 {
        return None;
    }

    let total = hours * 360_000 + minutes * 6_000 + secs * 100 + centis;
    Some(total as f64 / 100.0)
}

fn two_digits(s: &str) -> Option<u64> {
    if s.len() != 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_timestamp(0.0), "0:00:00.00");
        assert_eq!(format_timestamp(2.0), "0:00:02.00");
        assert_eq!(format_timestamp(61.5), "0:01:01.50");
        assert_eq!(format_timestamp(3600.0), "1:00:00.00");
        assert_eq!(format_timestamp(36_000.0 + 59.99), "10:00:59.99");
    }

    #[test]
    fn test_rounding_to_centiseconds() {
        assert_eq!(format_timestamp(1.234), "0:00:01.23");
        assert_eq!(format_timestamp(1.235_1), "0:00:01.24");
        assert_eq!(format_timestamp(59.999), "0:01:00.00");
    }

    #[test]
    fn test_invalid_input_is_zero() {
        assert_eq!(format_timestamp(f64::NAN), "0:00:00.00");
        assert_eq!(format_timestamp(f64::INFINITY), "0:00:00.00");
        assert_eq!(format_timestamp(-3.0), "0:00:00.00");
    }

    #[test]
    fn test_ms_input() {
        assert_eq!(format_timestamp(ms_to_seconds(2000)), "0:00:02.00");
        assert_eq!(format_timestamp(ms_to_seconds(4006)), "0:00:04.01");
    }

    #[test]
    fn test_round_trip_within_one_centisecond() {
        let mut t = 0.0_f64;
        while t < 7300.0 {
            let parsed = parse_timestamp(&format_timestamp(t)).unwrap();
            assert!((parsed - t).abs() <= 0.01 + 1e-9, "t={} parsed={}", t, parsed);
            t += 0.737;
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_timestamp("0:0:00.00").is_none());
        assert!(parse_timestamp("0:00:00").is_none());
        assert!(parse_timestamp("0:61:00.00").is_none());
        assert!(parse_timestamp("a:00:00.00").is_none());
        assert_eq!(parse_timestamp("1:02:03.04"), Some(3723.04));
    }
}
