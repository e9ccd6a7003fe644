//! Path evaluation over JSON values
//!
//! Two selector grammars are supported:
//! - JSONPath, for selectors starting with `$`
//! - Dot paths (`data.items`, `items.0`, `items[-1]`, `items.#`, `items.#.id`)

use crate::error::{Error, Result};
use crate::types::JsonValue;
use jsonpath_rust::JsonPath;

/// Evaluate a root selector against a JSON value
///
/// Any failure is reported as [`Error::InvalidPath`]; partial results are
/// never returned.
pub fn select_root(value: &JsonValue, selector: &str) -> Result<JsonValue> {
    if selector.starts_with('$') {
        return select_jsonpath(value, selector);
    }
    select_path(value, selector).ok_or_else(|| Error::invalid_path(selector))
}

/// Evaluate a dot path, returning `None` when it does not resolve
pub fn select_path(value: &JsonValue, path: &str) -> Option<JsonValue> {
    let segments = split_path(path);
    if segments.is_empty() {
        return None;
    }
    select_segments(value, &segments)
}

fn select_jsonpath(value: &JsonValue, selector: &str) -> Result<JsonValue> {
    let jp = JsonPath::try_from(selector).map_err(|_| Error::invalid_path(selector))?;

    match jp.find(value) {
        JsonValue::Array(mut matches) => match matches.len() {
            0 => Err(Error::invalid_path(selector)),
            1 => Ok(matches.remove(0)),
            _ => Ok(JsonValue::Array(matches)),
        },
        JsonValue::Null => Err(Error::invalid_path(selector)),
        other => Ok(other),
    }
}

/// Split on unescaped dots; `\.` yields a literal dot
fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    if segments.len() == 1 && segments[0].is_empty() {
        return Vec::new();
    }
    segments
}

fn select_segments(value: &JsonValue, segments: &[String]) -> Option<JsonValue> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    if segment == "#" {
        let JsonValue::Array(items) = value else {
            return None;
        };
        if rest.is_empty() {
            return Some(JsonValue::from(items.len()));
        }
        let mapped = items
            .iter()
            .filter_map(|item| select_segments(item, rest))
            .collect();
        return Some(JsonValue::Array(mapped));
    }

    let next = step(value, segment)?;
    select_segments(next, rest)
}

/// Resolve one segment: object key, array index, or `name[i]`
fn step<'a>(value: &'a JsonValue, segment: &str) -> Option<&'a JsonValue> {
    if let Some((name, index)) = parse_indexed(segment) {
        let target = if name.is_empty() {
            value
        } else {
            value.get(name)?
        };
        return index_array(target, index);
    }

    match value {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(_) => index_array(value, segment.parse().ok()?),
        _ => None,
    }
}

/// Parse `name[i]` into its name and (possibly negative) index
fn parse_indexed(segment: &str) -> Option<(&str, i64)> {
    let inner = segment.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let index = inner[open + 1..].trim().parse().ok()?;
    Some((&inner[..open], index))
}

fn index_array(value: &JsonValue, index: i64) -> Option<&JsonValue> {
    let JsonValue::Array(items) = value else {
        return None;
    };
    #[allow(clippy::cast_possible_wrap)]
    let resolved = if index < 0 {
        items.len() as i64 + index
    } else {
        index
    };
    usize::try_from(resolved).ok().and_then(|i| items.get(i))
}
