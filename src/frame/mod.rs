//! Frame module
//!
//! Columnar results built from JSON payloads.
//!
//! # Overview
//!
//! - [`Framer`] / [`ArrowFramer`] turn a JSON value into a [`Frame`]
//! - [`Frame`] wraps an Arrow `RecordBatch` plus [`FrameMeta`]
//! - Schema inference keeps fields in order of first appearance

mod framer;
mod schema;
mod types;

pub use framer::{ArrowFramer, Framer, FramerOptions};
pub use schema::{arrow_to_json, infer_schema, json_to_arrow};
pub use types::{CustomMeta, Frame, FrameMeta, DEFAULT_FRAME_NAME, NOT_AVAILABLE_QUERY_STRING};
