// ABOUTME: Date normalization for review dates shown as "5 Jan 2024" style text.
// ABOUTME: Produces canonical YYYY-MM-DD strings and the current-date default.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical output format for every review date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DAY_MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{4})").unwrap()
});

const MONTHS: [(&str, &str); 12] = [
    ("Jan", "01"),
    ("Feb", "02"),
    ("Mar", "03"),
    ("Apr", "04"),
    ("May", "05"),
    ("Jun", "06"),
    ("Jul", "07"),
    ("Aug", "08"),
    ("Sep", "09"),
    ("Oct", "10"),
    ("Nov", "11"),
    ("Dec", "12"),
];

/// Maps a three-letter month abbreviation to its two-digit number.
/// Unrecognized abbreviations map to "01".
pub fn month_number(abbrev: &str) -> &'static str {
    MONTHS
        .iter()
        .find(|(name, _)| *name == abbrev)
        .map(|(_, num)| *num)
        .unwrap_or("01")
}

/// Builds `YYYY-MM-DD` from its parts.
///
/// The calendar is not validated: "31 Feb 2024" becomes "2024-02-31".
pub fn normalize_date(day: u32, month: &str, year: u32) -> String {
    format!("{:04}-{}-{:02}", year, month_number(month), day)
}

/// Finds the first "day month year" fragment in `text` and normalizes it.
pub fn find_date(text: &str) -> Option<String> {
    let caps = DAY_MONTH_YEAR_RE.captures(text)?;
    let day = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let year = caps.get(3)?.as_str().parse::<u32>().ok()?;
    Some(normalize_date(day, caps.get(2)?.as_str(), year))
}

/// Parses an ISO-like date (`2024-01-15`, `2024-01-15T10:00:00Z`) as found in
/// structured data and returns it in canonical form.
pub fn parse_iso_date(s: &str) -> Option<String> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Today's local date, the default for reviews without a recognizable date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(s: &str) -> bool {
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(s)
    }

    #[test]
    fn pads_single_digit_day() {
        assert_eq!(normalize_date(5, "Jan", 2024), "2024-01-05");
        assert_eq!(normalize_date(23, "Dec", 2023), "2023-12-23");
    }

    #[test]
    fn every_month_maps() {
        for (i, (name, _)) in MONTHS.iter().enumerate() {
            let out = normalize_date(1, name, 2020);
            assert_eq!(out, format!("2020-{:02}-01", i + 1));
            assert!(is_canonical(&out));
        }
    }

    #[test]
    fn unknown_month_defaults_to_january() {
        assert_eq!(month_number("Foo"), "01");
        assert_eq!(normalize_date(9, "Sept", 2021), "2021-01-09");
    }

    #[test]
    fn no_calendar_validation() {
        assert_eq!(normalize_date(31, "Feb", 2024), "2024-02-31");
    }

    #[test]
    fn finds_date_inside_text() {
        assert_eq!(
            find_date("Reviewed on 7 Mar 2023 by someone"),
            Some("2023-03-07".to_string())
        );
        assert_eq!(find_date("March 7, 2023"), None);
        assert_eq!(find_date(""), None);
    }

    #[test]
    fn month_match_is_case_sensitive() {
        assert_eq!(find_date("7 mar 2023"), None);
    }

    #[test]
    fn parses_iso_prefix() {
        assert_eq!(parse_iso_date("2024-01-15"), Some("2024-01-15".to_string()));
        assert_eq!(
            parse_iso_date("2024-01-15T10:00:00Z"),
            Some("2024-01-15".to_string())
        );
        assert_eq!(parse_iso_date("15/01/2024"), None);
        assert_eq!(parse_iso_date("short"), None);
    }

    #[test]
    fn today_is_canonical() {
        assert!(is_canonical(&today().format(DATE_FORMAT).to_string()));
    }
}
