//! Post search filters
//!
//! A search is addressed by a slash-delimited path fragment:
//!
//! ```text
//! [@]username / from_date / days
//! ```
//!
//! Every segment is optional and parsing is forgiving: a segment that does
//! not look like what the position expects is left for the next position,
//! and anything that is still unparseable is ignored.
//!
//! # Example
//! ```
//! use chrono::NaiveDate;
//! use postline_core::SearchFilter;
//!
//! let filter = SearchFilter::parse("alice/2023-08-29/-5");
//! assert_eq!(filter.username.as_deref(), Some("alice"));
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let range = filter.date_range(today).unwrap().unwrap();
//! assert_eq!(range.from, NaiveDate::from_ymd_opt(2023, 8, 24).unwrap());
//! assert_eq!(range.to, NaiveDate::from_ymd_opt(2023, 8, 29).unwrap());
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Parsed search path, before any date arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub username: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub days: Option<i64>,
}

impl SearchFilter {
    /// Parse a search path fragment. Never fails.
    ///
    /// Dates are `YYYY-MM-DD`, `YYYYMMDD`, or ISO week dates (`2023-W35-2`,
    /// `2023W352`). Days may carry surrounding whitespace and `_` digit
    /// separators (` 5`, `1_000`).
    pub fn parse(input: &str) -> Self {
        let tokens: Vec<&str> = input.split('/').collect();
        let mut idx = 0;
        let mut username = None;
        let mut explicit_username = false;

        // Leading slash
        if tokens.first().is_some_and(|t| t.is_empty()) {
            idx += 1;
        }

        if let Some(token) = tokens.get(idx) {
            if token.is_empty() {
                idx += 1;
            } else if let Some(name) = token.strip_prefix('@') {
                if !name.is_empty() {
                    username = Some(name.to_owned());
                    explicit_username = true;
                }
                idx += 1;
            } else if !token.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
                username = Some((*token).to_owned());
                idx += 1;
            }
        }

        let from_date = tokens.get(idx).and_then(|t| parse_iso_date(t));
        if from_date.is_some() {
            idx += 1;
        }

        let days = tokens.get(idx).and_then(|t| parse_days(t));

        // A bare word with nothing after it is not a search
        if from_date.is_none() && days.is_none() && !explicit_username {
            username = None;
        }

        Self {
            username,
            from_date,
            days,
        }
    }

    /// Resolve the date part of the filter into a half-open range.
    ///
    /// `today` anchors a days offset given without an explicit date.
    pub fn date_range(&self, today: NaiveDate) -> Result<Option<DateRange>> {
        let from = match (self.from_date, self.days) {
            (None, None) => return Ok(None),
            (Some(date), _) => date,
            (None, Some(_)) => today,
        };

        let end = shift(from, self.days.unwrap_or(1))?;
        let range = if end < from {
            DateRange { from: end, to: from }
        } else {
            DateRange { from, to: end }
        };

        Ok(Some(range))
    }

    /// Resolve into the query the repository executes.
    pub fn resolve(&self, today: NaiveDate) -> Result<SearchQuery> {
        Ok(SearchQuery {
            username: self.username.clone(),
            range: self.date_range(today)?,
        })
    }
}

impl FromStr for SearchFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Half-open calendar range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days().max(0)
    }

    /// Inclusive lower bound as a UTC instant (midnight).
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound as a UTC instant (midnight).
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.to.and_time(NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

/// Fully resolved search: what the repository turns into SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub username: Option<String>,
    pub range: Option<DateRange>,
}

impl SearchQuery {
    /// True when the search returns every post.
    pub fn is_unfiltered(&self) -> bool {
        self.username.is_none() && self.range.is_none()
    }
}

/// Accepts `YYYY-MM-DD`, `YYYYMMDD` and the ISO week forms `YYYY-Www-D`
/// and `YYYYWwwD`.
fn parse_iso_date(token: &str) -> Option<NaiveDate> {
    let bytes = token.as_bytes();
    let digits_at = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        8 if digits_at(0..8) => NaiveDate::parse_from_str(token, "%Y%m%d").ok(),
        8 if bytes[4] == b'W' && digits_at(0..4) && digits_at(5..8) => {
            NaiveDate::parse_from_str(token, "%GW%V%u").ok()
        }
        10 if bytes[4] == b'-'
            && bytes[5] == b'W'
            && bytes[8] == b'-'
            && digits_at(0..4)
            && digits_at(6..8)
            && digits_at(9..10) =>
        {
            NaiveDate::parse_from_str(token, "%G-W%V-%u").ok()
        }
        10 if bytes[4] == b'-'
            && bytes[7] == b'-'
            && digits_at(0..4)
            && digits_at(5..7)
            && digits_at(8..10) =>
        {
            NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Signed integer with optional surrounding whitespace and single `_`
/// separators between digits.
fn parse_days(token: &str) -> Option<i64> {
    let token = token.trim();
    let (sign, digits) = match token.strip_prefix(['-', '+']) {
        Some(rest) => (&token[..1], rest),
        None => ("", token),
    };

    let groups: Vec<&str> = digits.split('_').collect();
    if groups
        .iter()
        .any(|g| g.is_empty() || !g.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    format!("{}{}", sign, groups.concat()).parse().ok()
}

fn shift(from: NaiveDate, days: i64) -> Result<NaiveDate> {
    let shifted = if days >= 0 {
        from.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        from.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or(CoreError::DateOutOfRange { from, days })
}
