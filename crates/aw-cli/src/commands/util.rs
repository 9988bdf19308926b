//! Shared utilities for CLI commands.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Formats a duration as `1h 02m 03s`, `4m 05s` or `6s`.
///
/// Sub-second precision is dropped. Negative durations (clock skew between
/// observations) keep a leading minus sign.
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{sign}{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m {seconds:02}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

/// Formats an optional duration, treating absent as not yet accrued.
pub fn format_optional_duration(duration: Option<TimeDelta>) -> String {
    duration.map_or_else(|| "-".to_string(), format_duration)
}

/// Formats an optional timestamp in RFC 3339 with second precision.
pub fn format_optional_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || "-".to_string(),
        |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_picks_largest_unit() {
        assert_eq!(format_duration(TimeDelta::seconds(6)), "6s");
        assert_eq!(format_duration(TimeDelta::seconds(245)), "4m 05s");
        assert_eq!(format_duration(TimeDelta::seconds(3723)), "1h 02m 03s");
        assert_eq!(format_duration(TimeDelta::hours(50)), "50h 00m 00s");
    }

    #[test]
    fn format_duration_keeps_negative_sign() {
        assert_eq!(format_duration(TimeDelta::seconds(-61)), "-1m 01s");
    }

    #[test]
    fn optional_values_render_dash() {
        assert_eq!(format_optional_duration(None), "-");
        assert_eq!(format_optional_timestamp(None), "-");
    }

    #[test]
    fn format_optional_timestamp_uses_utc_suffix() {
        let ts = DateTime::parse_from_rfc3339("2025-01-01T10:30:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_optional_timestamp(Some(ts)), "2025-01-01T10:30:00Z");
    }
}
