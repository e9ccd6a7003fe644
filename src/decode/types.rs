//! Payload types
//!
//! A fetched or inline body is either parsed JSON or raw text.

use crate::query::QueryType;
use crate::types::JsonValue;
use serde::Serialize;

/// Content type marker that turns on JSON decoding for UQL/GROQ bodies
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Body of a query result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Parsed JSON
    Json(JsonValue),
    /// Raw text, passed through undecoded
    Text(String),
    /// No body (e.g. the request was never sent)
    #[default]
    Empty,
}

impl Payload {
    /// The raw text, when this payload was not decoded
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether there is no body at all
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// JSON rendering used in metadata
    pub fn to_value(&self) -> JsonValue {
        match self {
            Payload::Json(value) => value.clone(),
            Payload::Text(text) => JsonValue::String(text.clone()),
            Payload::Empty => JsonValue::Null,
        }
    }
}

/// How a response body is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// Always parse as JSON
    Json,
    /// Parse as JSON only when the response declares a JSON content type
    JsonWhenDeclared,
    /// Keep the raw text
    Text,
}

impl BodyFormat {
    /// Decoding rule for a query type
    pub fn for_query_type(query_type: &QueryType) -> Self {
        if query_type.is_json() {
            BodyFormat::Json
        } else if query_type.is_json_when_declared() {
            BodyFormat::JsonWhenDeclared
        } else {
            BodyFormat::Text
        }
    }

    /// Whether a body with this content type is parsed as JSON
    pub fn parses_json(self, content_type: Option<&str>) -> bool {
        match self {
            BodyFormat::Json => true,
            BodyFormat::JsonWhenDeclared => content_type
                .is_some_and(|ct| ct.to_ascii_lowercase().contains(CONTENT_TYPE_JSON)),
            BodyFormat::Text => false,
        }
    }
}
