//! Cell coercions shared by every calculator.
//!
//! All numeric parsing goes through [`RawValue::as_number`] so that type
//! inference, statistics, the dataset summary and chart projection agree on
//! what "parses as a number" means.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::RawValue;

static CURRENCY_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$,]").expect("static pattern"));

const BOOLEAN_TOKENS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

impl RawValue {
    /// Null, absent and empty-string cells all count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of a cell. Strings lose every `$` and `,` before
    /// parsing; anything that is not a finite number yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) if n.is_finite() => Some(*n),
            RawValue::Text(s) => parse_numeric_text(s),
            _ => None,
        }
    }

    /// Canonical string form, used for distinctness, grouping and labels.
    pub fn as_string(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => b.to_string(),
            // -0 and 0 are one value
            RawValue::Number(n) => (n + 0.0).to_string(),
            RawValue::Text(s) => s.clone(),
            RawValue::Date(d) => format_date(d),
        }
    }

    pub fn is_boolean_token(&self) -> bool {
        match self {
            RawValue::Bool(_) => true,
            RawValue::Text(s) => {
                let token = s.trim();
                BOOLEAN_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
            }
            _ => false,
        }
    }

    pub fn is_date_like(&self) -> bool {
        match self {
            RawValue::Date(_) => true,
            RawValue::Text(s) => parse_date_text(s).is_some(),
            _ => false,
        }
    }
}

pub fn parse_numeric_text(s: &str) -> Option<f64> {
    let cleaned = CURRENCY_NOISE.replace_all(s, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses the date layouts commonly found in sheets.
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn format_date(d: &NaiveDateTime) -> String {
    if d.time() == NaiveTime::MIN {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Fraction of `values` that parse as numbers; 0 for an empty slice.
pub fn numeric_fraction<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a RawValue>,
{
    let (parsed, total) = values.into_iter().fold((0usize, 0usize), |(parsed, total), v| {
        (parsed + usize::from(v.as_number().is_some()), total + 1)
    });
    if total == 0 {
        0.0
    } else {
        parsed as f64 / total as f64
    }
}
