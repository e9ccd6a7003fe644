//! Response extractor
//!
//! Narrows a fetched (or inline) payload to the part addressed by a query's
//! root selector before it is framed.

mod path;

pub use path::{select_path, select_root};

use crate::decode::Payload;
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Apply a root selector to a fetched payload
///
/// An empty selector returns the payload unchanged. A text payload is parsed
/// as JSON first; a payload that is not JSON cannot be selected into.
pub fn apply_root_selector(payload: &Payload, selector: &str) -> Result<JsonValue> {
    if selector.is_empty() {
        return Ok(payload.to_value());
    }

    match payload {
        Payload::Json(value) => select_root(value, selector),
        Payload::Text(text) => {
            let value: JsonValue =
                serde_json::from_str(text).map_err(|_| Error::invalid_path(selector))?;
            select_root(&value, selector)
        }
        Payload::Empty => Err(Error::invalid_path(selector)),
    }
}

/// Parse inline JSON text and apply a root selector to it
pub fn apply_root_selector_text(text: &str, selector: &str) -> Result<JsonValue> {
    let value: JsonValue = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) if !selector.is_empty() => return Err(Error::invalid_path(selector)),
        Err(e) => return Err(Error::parse(e.to_string())),
    };

    if selector.is_empty() {
        return Ok(value);
    }
    select_root(&value, selector)
}

#[cfg(test)]
mod tests;
