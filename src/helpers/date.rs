//! Date helper functions

use chrono::{DateTime, TimeZone, Utc};

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY") // -> "25 Mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a UTC timestamp in the site timezone.
///
/// An empty or unknown timezone name falls back to UTC.
pub fn format_local(date: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    match parse_timezone(timezone) {
        Some(tz) => format_date(&date.with_timezone(&tz), format),
        None => format_date(date, format),
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

fn parse_timezone(name: &str) -> Option<chrono_tz::Tz> {
    if name.trim().is_empty() {
        return None;
    }
    match name.trim().parse::<chrono_tz::Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::warn!("unknown timezone {:?}, using UTC", name);
            None
        }
    }
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each unit
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 25, 19, 25, 28).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&published(), "DD MMM YYYY"), "25 Mar 2021");
        assert_eq!(format_date(&published(), "YYYY-MM-DD"), "2021-03-25");
        assert_eq!(format_date(&published(), "HH:mm"), "19:25");
    }

    #[test]
    fn test_format_local() {
        assert_eq!(
            format_local(&published(), "America/Sao_Paulo", "DD MMM YYYY, HH:mm"),
            "25 Mar 2021, 16:25"
        );
        assert_eq!(format_local(&published(), "", "HH:mm"), "19:25");
        assert_eq!(format_local(&published(), "Mars/Olympus", "HH:mm"), "19:25");
    }

    #[test]
    fn test_date_xml() {
        assert_eq!(date_xml(&published()), "2021-03-25T19:25:28+00:00");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("DD MMM YYYY"), "%d %b %Y");
    }
}
