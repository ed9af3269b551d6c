//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Days, Local, NaiveDate};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~1000 years in days).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Parse a date as `YYYY-MM-DD`, `today`, `yesterday` or `N days/weeks ago`.
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    parse_date_from(s, Local::now().date_naive())
}

/// Like [`parse_date`], with relative dates counted back from `today`.
pub fn parse_date_from(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return days_before(today, 1),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };
    if days > MAX_RELATIVE_DAYS {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }
    days_before(today, days)
}

fn days_before(today: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("date out of range: {days} days before {today}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_absolute_date() {
        assert_eq!(
            parse_date_from("2024-01-10", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_named_days() {
        assert_eq!(parse_date_from("today", today()).unwrap(), today());
        assert_eq!(
            parse_date_from("Yesterday", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_relative_dates() {
        assert_eq!(
            parse_date_from("3 days ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 26).unwrap()
        );
        assert_eq!(
            parse_date_from("1 day ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            parse_date_from("2 weeks ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
        );
    }

    #[test]
    fn test_invalid_dates() {
        assert!(parse_date_from("next tuesday", today()).is_err());
        assert!(parse_date_from("2024-13-01", today()).is_err());
        assert!(parse_date_from("99999999 days ago", today()).is_err());
    }
}
