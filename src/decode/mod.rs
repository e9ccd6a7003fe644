//! Response decoder module
//!
//! Turns a response body into a [`Payload`]. JSON-like query types are
//! parsed, UQL/GROQ only when the server declares JSON, everything else
//! passes through as text.

mod decoders;
mod types;

pub use decoders::{decode_body, Decoded};
pub use types::{BodyFormat, Payload, CONTENT_TYPE_JSON};
