//! Time-range macro interpolation
//!
//! Rewrites `${__from}`-style macros in the URL, body, parameter values and
//! header values of a query before it is executed.
//!
//! Supported forms:
//! - `${__from}` / `${__to}` (also `${__timeFrom}` / `${__timeTo}`): epoch milliseconds
//! - `${__from:date}` / `${__from:date:iso}`: RFC 3339 with milliseconds
//! - `${__from:date:seconds}`: epoch seconds
//! - `${__from:date:<strftime>}`: chrono format string
//! - `$__unixEpochFrom()` / `$__unixEpochTo()`: epoch seconds

use super::types::Query;
use crate::error::{Error, Result};
use crate::types::TimeRange;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Regex for `${__from}`, `${__to:date:iso}` and friends
static TIME_MACRO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{__(from|to|timeFrom|timeTo)(:date(?::([^}]*))?)?\}").unwrap()
});

/// Regex for `$__unixEpochFrom()` and `$__unixEpochTo()`
static EPOCH_MACRO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$__unixEpoch(From|To)\(\)").unwrap());

/// Rewrites a query for a time range before execution
pub trait Interpolator: Send + Sync {
    /// Return the query with every macro resolved
    fn interpolate(&self, query: Query, range: &TimeRange) -> Result<Query>;
}

/// Default interpolator resolving the built-in time macros
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroInterpolator;

impl MacroInterpolator {
    /// Create a new interpolator
    pub fn new() -> Self {
        Self
    }
}

impl Interpolator for MacroInterpolator {
    fn interpolate(&self, mut query: Query, range: &TimeRange) -> Result<Query> {
        query.url = interpolate_str(&query.url, range)?;
        query.url_options.data = interpolate_str(&query.url_options.data, range)?;
        for param in &mut query.url_options.params {
            param.value = interpolate_str(&param.value, range)?;
        }
        for header in &mut query.url_options.headers {
            header.value = interpolate_str(&header.value, range)?;
        }
        Ok(query)
    }
}

/// Resolve every time macro in a string
pub fn interpolate_str(input: &str, range: &TimeRange) -> Result<String> {
    if !input.contains('$') {
        return Ok(input.to_string());
    }

    let mut failure = None;
    let replaced = TIME_MACRO_REGEX.replace_all(input, |caps: &Captures| {
        let time = pick(range, &caps[1]);
        let format = match (caps.get(2), caps.get(3)) {
            (None, _) => None,
            (Some(_), None) => Some("iso"),
            (Some(_), Some(fmt)) => Some(fmt.as_str()),
        };
        match format_time(time, format) {
            Ok(s) => s,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }

    let replaced = EPOCH_MACRO_REGEX.replace_all(&replaced, |caps: &Captures| {
        pick(range, &caps[1]).timestamp().to_string()
    });

    Ok(replaced.into_owned())
}

fn pick(range: &TimeRange, name: &str) -> DateTime<Utc> {
    match name {
        "from" | "timeFrom" | "From" => range.from,
        _ => range.to,
    }
}

/// Render a time in the requested macro format
fn format_time(time: DateTime<Utc>, format: Option<&str>) -> Result<String> {
    match format {
        None => Ok(time.timestamp_millis().to_string()),
        Some("" | "iso") => Ok(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Some("seconds") => Ok(time.timestamp().to_string()),
        Some(custom) => {
            let items: Vec<Item<'_>> = StrftimeItems::new(custom).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(Error::interpolation(format!(
                    "invalid date format '{custom}'"
                )));
            }
            Ok(time.format_with_items(items.into_iter()).to_string())
        }
    }
}
