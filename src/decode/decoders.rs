//! Body decoding

use super::types::{BodyFormat, Payload};
use crate::error::Error;
use crate::types::JsonValue;

/// Result of decoding a body
///
/// A parse failure keeps the raw text as the payload next to the error.
#[derive(Debug)]
pub struct Decoded {
    /// Decoded (or raw) payload
    pub payload: Payload,
    /// Parse failure, if any
    pub error: Option<Error>,
}

impl Decoded {
    fn ok(payload: Payload) -> Self {
        Self {
            payload,
            error: None,
        }
    }
}

/// Decode a response body according to `format` and the response content type
pub fn decode_body(format: BodyFormat, content_type: Option<&str>, body: String) -> Decoded {
    if !format.parses_json(content_type) {
        return Decoded::ok(Payload::Text(body));
    }

    match serde_json::from_str::<JsonValue>(&body) {
        Ok(value) => Decoded::ok(Payload::Json(value)),
        Err(e) => Decoded {
            payload: Payload::Text(body),
            error: Some(Error::parse(e.to_string())),
        },
    }
}
