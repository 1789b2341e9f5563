use crate::prelude::*;
use std::time::Duration;

/// Parse a duration setting.
/// Supports humantime format: "5s", "500ms", "2m", "1h 30m", etc.
/// A bare number is read as seconds ("2" = 2s, "0.5" = 500ms).
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(seconds) = s.parse::<f64>() {
        ensure!(
            seconds.is_finite() && seconds >= 0.0,
            "Invalid duration '{s}': must be a positive number of seconds"
        );
        return Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("Invalid duration '{s}': too large"));
    }

    humantime::parse_duration(s).with_context(|| {
        format!("Invalid duration format: '{s}'. Expected format like '5s', '500ms', '2m', '1h' or a number in seconds")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("5s", Duration::from_secs(5))]
    #[case("500ms", Duration::from_millis(500))]
    #[case("30m", Duration::from_secs(30 * 60))]
    #[case("1h 30m", Duration::from_secs(90 * 60))]
    #[case("2", Duration::from_secs(2))]
    #[case("0.5", Duration::from_millis(500))]
    #[case(" 0 ", Duration::ZERO)]
    fn test_parse_duration(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("soon")]
    #[case("-3")]
    #[case("5 parsecs")]
    #[case("1e30")]
    fn test_parse_duration_invalid(#[case] input: &str) {
        assert!(parse_duration(input).is_err());
    }
}
