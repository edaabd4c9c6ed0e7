//! Listing date text to calendar dates
//!
//! The listing renders dates as `"Jun 10, 2024"` for single-day events and
//! `"Jun 10 - 12, 2024"` for ranges inside one month. Ranges across a month
//! or year boundary are rendered by the site with extra month/year tokens;
//! those are rejected rather than guessed at.

use chrono::NaiveDate;

use crate::utils::error::DateParseError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parser for listing date text
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeParser;

impl DateRangeParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse date text into `(start, end)`
    ///
    /// # Errors
    ///
    /// Returns a [`DateParseError`] describing the first problem found.
    pub fn parse(&self, raw: &str) -> Result<(NaiveDate, NaiveDate), DateParseError> {
        parse_date_range(raw)
    }
}

/// Parse date text into `(start, end)`
///
/// Commas are dropped and the remaining text is split on whitespace:
///
/// * `Mon D YYYY` (3 tokens) is a single-day event, `start == end`
/// * `Mon D1 - D2 YYYY` (5 tokens) is a range; the month and year tokens
///   apply to both bounds
///
/// # Errors
///
/// * [`DateParseError::Empty`] for blank input
/// * [`DateParseError::CrossBoundaryRange`] when a second month token follows the hyphen
/// * [`DateParseError::UnexpectedLayout`] for any other token layout
/// * [`DateParseError::InvalidMonth`], [`DateParseError::InvalidNumber`],
///   [`DateParseError::InvalidDate`], [`DateParseError::ReversedRange`] for bad components
pub fn parse_date_range(raw: &str) -> Result<(NaiveDate, NaiveDate), DateParseError> {
    let cleaned = raw.replace(',', " ").replace(['\u{2013}', '\u{2014}'], "-");
    let tokens = split_tokens(&cleaned);

    if tokens.is_empty() {
        return Err(DateParseError::Empty);
    }

    let Some(hyphen) = tokens.iter().position(|t| *t == "-") else {
        if tokens.len() != 3 {
            return Err(DateParseError::UnexpectedLayout(raw.trim().to_string()));
        }
        let month = parse_month(tokens[0])?;
        let day = parse_number(tokens[1], "day")?;
        let year = parse_year(tokens[2])?;
        let date = build_date(year, month, day, raw)?;
        return Ok((date, date));
    };

    // "Jun 30 - Jul 2 2024" or "Dec 30 2024 - Jan 2 2025"
    if tokens[hyphen + 1..].iter().any(|t| parse_month(t).is_ok()) {
        return Err(DateParseError::CrossBoundaryRange(raw.trim().to_string()));
    }

    if tokens.len() != 5 || hyphen != 2 {
        return Err(DateParseError::UnexpectedLayout(raw.trim().to_string()));
    }

    let month = parse_month(tokens[0])?;
    let start_day = parse_number(tokens[1], "day")?;
    let end_day = parse_number(tokens[3], "day")?;
    let year = parse_year(tokens[4])?;

    let start = build_date(year, month, start_day, raw)?;
    let end = build_date(year, month, end_day, raw)?;

    if end < start {
        return Err(DateParseError::ReversedRange(raw.trim().to_string()));
    }

    Ok((start, end))
}

/// Split on whitespace, keeping a glued hyphen ("10-12") as its own token
fn split_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let mut rest = word;
        while let Some(idx) = rest.find('-') {
            if idx > 0 {
                tokens.push(&rest[..idx]);
            }
            tokens.push("-");
            rest = &rest[idx + 1..];
        }
        if !rest.is_empty() {
            tokens.push(rest);
        }
    }
    tokens
}

fn parse_month(token: &str) -> Result<u32, DateParseError> {
    let lower = token.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| DateParseError::InvalidMonth(token.to_string()))
}

fn parse_number(token: &str, field: &'static str) -> Result<u32, DateParseError> {
    token
        .parse::<u32>()
        .map_err(|_| DateParseError::InvalidNumber {
            field,
            value: token.to_string(),
        })
}

fn parse_year(token: &str) -> Result<i32, DateParseError> {
    if token.len() != 4 {
        return Err(DateParseError::InvalidNumber {
            field: "year",
            value: token.to_string(),
        });
    }
    token
        .parse::<i32>()
        .map_err(|_| DateParseError::InvalidNumber {
            field: "year",
            value: token.to_string(),
        })
}

fn build_date(year: i32, month: u32, day: u32, raw: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::InvalidDate(raw.trim().to_string()))
}
