//! Framer implementations
//!
//! A framer turns the JSON selected by a query into a columnar [`Frame`].

use super::schema::{batch_from_columns, build_array, infer_values_type, json_to_arrow};
use super::types::Frame;
use crate::error::Result;
use crate::extract::select_path;
use crate::query::{ColumnDef, Query};
use crate::types::{JsonObject, JsonValue};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use std::sync::Arc;

/// Options passed from the query to the framer
#[derive(Debug, Clone, Default)]
pub struct FramerOptions {
    /// Column projection; empty means infer from the data
    pub columns: Vec<ColumnDef>,
}

impl FramerOptions {
    /// Options declared on a query
    pub fn from_query(query: &Query) -> Self {
        Self {
            columns: query.columns.clone(),
        }
    }
}

/// Converts a JSON value into a frame
pub trait Framer: Send + Sync {
    /// Build the frame for `ref_id` from `value`
    fn to_frame(&self, ref_id: &str, value: &JsonValue, options: &FramerOptions) -> Result<Frame>;
}

/// Default framer producing Arrow record batches
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowFramer;

impl ArrowFramer {
    /// Create a new framer
    pub fn new() -> Self {
        Self
    }
}

impl Framer for ArrowFramer {
    fn to_frame(&self, ref_id: &str, value: &JsonValue, options: &FramerOptions) -> Result<Frame> {
        let records = to_records(value);

        let batch = if options.columns.is_empty() {
            json_to_arrow(&records, None)?
        } else {
            project_columns(&records, &options.columns)?
        };

        Ok(Frame::new(ref_id, batch))
    }
}

/// Rows of a value: objects as-is, anything else wrapped as `{"value": v}`
fn to_records(value: &JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => items.iter().map(as_record).collect(),
        other => vec![as_record(other)],
    }
}

fn as_record(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(_) => value.clone(),
        other => {
            let mut obj = JsonObject::new();
            obj.insert("value".to_string(), other.clone());
            JsonValue::Object(obj)
        }
    }
}

fn project_columns(records: &[JsonValue], columns: &[ColumnDef]) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());

    for column in columns {
        let values: Vec<Option<JsonValue>> = records
            .iter()
            .map(|record| select_path(record, &column.selector))
            .collect();
        let array = cast_column(&values, &column.column_type)?;
        fields.push(Field::new(column.name(), array.data_type().clone(), true));
        arrays.push(array);
    }

    batch_from_columns(Arc::new(Schema::new(fields)), arrays, records.len())
}

/// Build a column of the requested type; uncastable values become null
fn cast_column(values: &[Option<JsonValue>], column_type: &str) -> Result<ArrayRef> {
    let array: ArrayRef = match column_type {
        "string" => Arc::new(
            values
                .iter()
                .map(|v| v.as_ref().and_then(as_string))
                .collect::<StringArray>(),
        ),
        "number" => Arc::new(
            values
                .iter()
                .map(|v| v.as_ref().and_then(as_number))
                .collect::<Float64Array>(),
        ),
        "boolean" => Arc::new(
            values
                .iter()
                .map(|v| v.as_ref().and_then(as_bool))
                .collect::<BooleanArray>(),
        ),
        "timestamp" => Arc::new(
            values
                .iter()
                .map(|v| v.as_ref().and_then(as_timestamp_millis))
                .collect::<TimestampMillisecondArray>(),
        ),
        "timestamp_epoch" => Arc::new(
            values
                .iter()
                .map(|v| v.as_ref().and_then(as_number))
                .map(|secs| secs.map(|s| (s * 1000.0) as i64))
                .collect::<TimestampMillisecondArray>(),
        ),
        _ => {
            let refs: Vec<Option<&JsonValue>> = values.iter().map(Option::as_ref).collect();
            let data_type = infer_values_type(refs.iter().flatten().copied());
            build_array(&refs, &data_type)?
        }
    };
    Ok(array)
}

fn as_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_timestamp_millis(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| ts.timestamp_millis())
            .ok()
            .or_else(|| s.trim().parse().ok()),
        _ => None,
    }
}
