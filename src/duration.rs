//! ISO-8601 duration parsing for the upstream API's `contentDetails.duration`
//! field.
//!
//! `parse("PT1H30M45S") = 5445`, `parse("PT0S") = 0`, `parse("") = 0`.

/// Parses an ISO-8601 `PT#H#M#S` duration string into whole seconds.
///
/// Unparseable or empty input returns `0` rather than erroring: the upstream
/// API is the sole producer of this format and a malformed value is not
/// actionable for the caller (a video's `contentDetails.duration`).
pub fn parse_iso8601_duration(input: &str) -> u64 {
    let input = input.trim();
    if input.is_empty() {
        return 0;
    }

    let Some(rest) = input.strip_prefix("PT") else {
        return 0;
    };

    let mut total = 0u64;
    let mut number = String::new();

    for ch in rest.chars() {
        match ch {
            '0'..='9' => number.push(ch),
            'H' => {
                total += number.parse::<u64>().unwrap_or(0) * 3600;
                number.clear();
            }
            'M' => {
                total += number.parse::<u64>().unwrap_or(0) * 60;
                number.clear();
            }
            'S' => {
                total += number.parse::<u64>().unwrap_or(0);
                number.clear();
            }
            _ => {
                // Unknown component (e.g. a stray fractional separator); ignore it.
                number.clear();
            }
        }
    }

    total
}

/// Classifies a video as a "Short" based on the configured duration threshold.
pub fn is_short(duration_seconds: u64, max_short_seconds: u64) -> bool {
    duration_seconds > 0 && duration_seconds <= max_short_seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(parse_iso8601_duration("PT1H30M45S"), 5445);
    }

    #[test]
    fn parses_zero_seconds() {
        assert_eq!(parse_iso8601_duration("PT0S"), 0);
    }

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(parse_iso8601_duration(""), 0);
    }

    #[test]
    fn parses_minutes_only() {
        assert_eq!(parse_iso8601_duration("PT15M"), 900);
    }

    #[test]
    fn parses_hours_only() {
        assert_eq!(parse_iso8601_duration("PT2H"), 7200);
    }

    #[test]
    fn garbage_input_is_zero() {
        assert_eq!(parse_iso8601_duration("not a duration"), 0);
    }

    #[test]
    fn classifies_short_by_threshold() {
        assert!(is_short(60, 180));
        assert!(is_short(180, 180));
        assert!(!is_short(181, 180));
        assert!(!is_short(0, 180));
    }
}
