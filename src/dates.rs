//! Date formatting hook.
//!
//! The layout engine never interprets record dates. It hands the raw value to
//! a caller-supplied [`DateFormatter`] and prints whatever comes back.
//! [`ShortDateFormatter`] is provided for callers (the CLI among them) that
//! want the usual "Jan 5, 2024" rendering without writing their own.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub trait DateFormatter {
    fn format_date(&self, raw: &str) -> String;
}

impl<F> DateFormatter for F
where
    F: Fn(&str) -> String,
{
    fn format_date(&self, raw: &str) -> String {
        self(raw)
    }
}

pub const DEFAULT_DATE_PATTERN: &str = "%b %-d, %Y";

/// Parses ISO-8601 dates, datetimes and epoch milliseconds and prints them
/// with a `chrono` format pattern. Unrecognized input is echoed unchanged.
#[derive(Clone, Debug)]
pub struct ShortDateFormatter {
    pattern: String,
}

impl ShortDateFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(dt.date());
            }
        }
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            let millis: i64 = raw.parse().ok()?;
            return DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive());
        }
        None
    }
}

impl Default for ShortDateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_PATTERN)
    }
}

impl DateFormatter for ShortDateFormatter {
    fn format_date(&self, raw: &str) -> String {
        match Self::parse(raw) {
            Some(date) => date.format(&self.pattern).to_string(),
            None => {
                log::debug!("Unrecognized date value {raw:?}, printing as-is");
                raw.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_plain_and_rfc3339_dates() {
        let f = ShortDateFormatter::default();
        assert_eq!(f.format_date("2024-01-05"), "Jan 5, 2024");
        assert_eq!(f.format_date("2024-03-15T10:30:00.000Z"), "Mar 15, 2024");
        assert_eq!(f.format_date("2024-03-15T10:30:00"), "Mar 15, 2024");
    }

    #[test]
    fn formats_epoch_millis() {
        let f = ShortDateFormatter::new("%Y-%m-%d");
        assert_eq!(f.format_date("0"), "1970-01-01");
    }

    #[test]
    fn echoes_unparseable_input() {
        let f = ShortDateFormatter::default();
        assert_eq!(f.format_date("last tuesday"), "last tuesday");
    }

    #[test]
    fn closures_are_formatters() {
        let f = |raw: &str| format!("<{raw}>");
        assert_eq!(f.format_date("x"), "<x>");
    }
}
