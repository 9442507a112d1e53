//! Period labels and price cells.
//!
//! A period label is a column (or row) header naming a month. Published
//! workbooks have used several conventions over the years, so parsing tries
//! them in order and every result is truncated to the first of its month.

use super::sheet::{format_number, Cell};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y%m%d",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

struct PeriodPatterns {
    /// Whole label: `1990M01`, `1990-01`, `1990/1`, `199001`.
    year_month: Regex,
    /// Label prefix: `1990M01 ...`, `1990-01 ...`.
    year_month_prefix: Regex,
    /// `1990Jan`, `1990 January`.
    year_month_name: Regex,
    /// `Jan 1990`, `January-1990`.
    month_name_year: Regex,
    /// `1990`.
    bare_year: Regex,
}

fn patterns() -> &'static PeriodPatterns {
    static PATTERNS: OnceLock<PeriodPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PeriodPatterns {
        year_month: Regex::new(r"^(\d{4})[^\d]?(\d{1,2})$").expect("valid regex"),
        year_month_prefix: Regex::new(r"^(\d{4})(?:M|-)(\d{1,2})").expect("valid regex"),
        year_month_name: Regex::new(r"^(\d{4})[\s\-/]?([A-Za-z]{3,9})\.?$").expect("valid regex"),
        month_name_year: Regex::new(r"^([A-Za-z]{3,9})\.?[\s\-/,]*(\d{4})$").expect("valid regex"),
        bare_year: Regex::new(r"^\d{4}$").expect("valid regex"),
    })
}

/// Month number for an English month name or its three-letter abbreviation.
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    MONTH_NAMES
        .iter()
        .position(|full| *full == lower || (lower.len() == 3 && full.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn captured_year_month(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    first_of_month(year, month)
}

/// Parse a period label into the first day of its month.
///
/// Returns `None` for anything that is not a recognizable month, including
/// out-of-range months such as `1990M13`.
pub fn parse_period_label(label: &str) -> Option<NaiveDate> {
    let s = label.trim();
    if s.is_empty() {
        return None;
    }
    let p = patterns();

    if let Some(caps) = p.year_month.captures(s) {
        return captured_year_month(&caps);
    }
    if let Some(caps) = p.year_month_prefix.captures(s) {
        return captured_year_month(&caps);
    }
    if let Some(caps) = p.year_month_name.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        return first_of_month(year, month_from_name(&caps[2])?);
    }
    if let Some(caps) = p.month_name_year.captures(s) {
        let year: i32 = caps[2].parse().ok()?;
        return first_of_month(year, month_from_name(&caps[1])?);
    }
    if p.bare_year.is_match(s) {
        return first_of_month(s.parse().ok()?, 1);
    }

    parse_generic_date(s).and_then(|d| first_of_month(d.year(), d.month()))
}

fn parse_generic_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a header cell into the first day of its month.
pub fn parse_period(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => first_of_month(dt.year(), dt.month()),
        Cell::Number(n) => parse_period_label(&format_number(*n)),
        Cell::Text(s) => parse_period_label(s),
        Cell::Empty | Cell::Bool(_) | Cell::Error => None,
    }
}

/// Coerce a price cell to a number.
///
/// Blank, textual placeholders (`…`, `n.a.`) and non-finite values yield
/// `None`; they are dropped rather than read as zero.
pub fn parse_price(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) | Cell::Error => return None,
    };
    value.is_finite().then_some(value)
}
