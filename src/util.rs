// Shared formatting rules.
//
// Every downstream component formats dates, numbers and truncated labels
// through these helpers so the PDF, the workbook and the chart agree on
// the exact text they print.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_format::{Locale, ToFormattedString};

/// Ellipsis appended by [`truncate`].
pub const ELLIPSIS: char = '…';

/// Truncation limit for values in the statistics grid.
pub const STAT_VALUE_MAX: usize = 24;
/// Truncation limit for chart axis labels.
pub const AXIS_LABEL_MAX: usize = 12;
/// Truncation limit for generic table cells.
pub const TABLE_CELL_MAX: usize = 20;

pub const INVALID_DATE: &str = "Invalid Date";

/// Parse a timestamp coming from the data layer.
///
/// - Accepts RFC 3339 with any offset (normalized to UTC).
/// - Accepts `YYYY-MM-DDTHH:MM:SS[.fff]` without offset (taken as UTC).
/// - Accepts a bare `YYYY-MM-DD` (midnight UTC).
/// - Returns `None` for anything else, including empty strings.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `"MMM d, yyyy"`, e.g. `Jan 5, 2025`.
pub fn format_date_value(d: &DateTime<Utc>) -> String {
    d.format("%b %-d, %Y").to_string()
}

/// Same as [`format_date_value`] but starting from the raw string; an
/// unparseable input yields `"Invalid Date"` instead of an error.
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(d) => format_date_value(&d),
        None => INVALID_DATE.to_string(),
    }
}

/// Generation timestamp shown under report titles.
pub fn format_datetime(d: &DateTime<Utc>) -> String {
    d.format("%b %-d, %Y %H:%M UTC").to_string()
}

/// ISO calendar date of the UTC instant, used in artifact filenames.
pub fn format_filename_date(d: &DateTime<Utc>) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// `<prefix>-<from>-to-<to>.<ext>`
pub fn artifact_filename(prefix: &str, from: &DateTime<Utc>, to: &DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}-{}-to-{}.{}",
        prefix,
        format_filename_date(from),
        format_filename_date(to),
        ext
    )
}

/// Keep the first `max_len` characters and append an ellipsis when `s` is
/// longer than `max_len` characters; otherwise return `s` unchanged.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text is never
/// split inside a character.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len).collect();
    out.push(ELLIPSIS);
    out
}

/// Fixed-decimal rendering without thousands separators (`125.00`).
pub fn format_fixed(n: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, n)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console output (e.g. `1,204 apartments`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("2025-01-05", "Jan 5, 2025")]
    #[case("2025-01-05T10:00:00Z", "Jan 5, 2025")]
    #[case("2024-12-31T23:30:00-02:00", "Jan 1, 2025")]
    #[case("2025-03-15T08:00:00", "Mar 15, 2025")]
    #[case("not a date", "Invalid Date")]
    #[case("", "Invalid Date")]
    fn test_format_date(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(format_date(raw), expected);
    }

    #[test]
    fn test_filename_date_ignores_time_of_day() {
        let from = parse_timestamp("2025-01-05T10:00:00Z").unwrap();
        let to = parse_timestamp("2025-02-01T00:00:00Z").unwrap();
        assert_eq!(
            artifact_filename("water-consumption-analytics", &from, &to, "pdf"),
            "water-consumption-analytics-2025-01-05-to-2025-02-01.pdf"
        );
        let late = Utc.with_ymd_and_hms(2025, 1, 5, 23, 59, 59).unwrap();
        assert_eq!(format_filename_date(&late), "2025-01-05");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let out = truncate("abcdefghijklmnopqrstuvwxyz", 24);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), 25);
        assert_eq!(out, "abcdefghijklmnopqrstuvwx…");
    }

    #[rstest]
    #[case("short", 12, "short")]
    #[case("exactly12chr", 12, "exactly12chr")]
    #[case("thirteen char", 12, "thirteen cha…")]
    #[case("Wasserzähler Süd", 12, "Wasserzähler…")]
    fn test_truncate_limits(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate(input, max), expected);
    }

    #[test]
    fn test_format_fixed_and_int() {
        assert_eq!(format_fixed(125.0, 2), "125.00");
        assert_eq!(format_fixed(66.666, 1), "66.7");
        assert_eq!(format_int(1_204_u32), "1,204");
    }
}
