//! Frame types

use super::schema::arrow_to_json;
use crate::error::{Error, Result};
use crate::query::Query;
use crate::types::JsonValue;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;

/// Frame name used when a query has no refId
pub const DEFAULT_FRAME_NAME: &str = "response";

/// Executed query string for sources that are not executed
pub const NOT_AVAILABLE_QUERY_STRING: &str =
    "This feature is not available for this type of query yet";

/// Per-query diagnostics attached to a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMeta {
    /// The query as executed (after interpolation)
    pub query: Query,
    /// Payload (decoded, raw text, or the inline data)
    pub data: JsonValue,
    /// HTTP status from the upstream server (0 when none)
    pub response_code_from_server: u16,
    /// Fetch duration, serialized as nanoseconds
    #[serde(serialize_with = "serialize_nanos")]
    pub duration: Duration,
    /// Error message (empty when none)
    pub error: String,
}

impl CustomMeta {
    /// Metadata for a query with no fetch result yet
    pub fn new(query: Query) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    /// Record an error message
    pub fn set_error(&mut self, error: &Error) {
        self.error = error.to_string();
    }
}

fn serialize_nanos<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

/// Frame metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    /// Query string shown to users (secrets redacted)
    pub executed_query_string: String,
    /// Connector diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomMeta>,
}

/// A named columnar result
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame name (refId, or `response`)
    pub name: String,
    /// Query id this frame answers
    pub ref_id: String,
    /// Columnar data, possibly with zero fields
    pub batch: RecordBatch,
    /// Metadata
    pub meta: FrameMeta,
}

impl Frame {
    /// Create a frame from a batch
    pub fn new(ref_id: impl Into<String>, batch: RecordBatch) -> Self {
        let ref_id = ref_id.into();
        let name = if ref_id.is_empty() {
            DEFAULT_FRAME_NAME.to_string()
        } else {
            ref_id.clone()
        };
        Self {
            name,
            ref_id,
            batch,
            meta: FrameMeta::default(),
        }
    }

    /// Create a frame with no fields
    pub fn empty(ref_id: impl Into<String>) -> Self {
        Self::new(ref_id, RecordBatch::new_empty(Arc::new(Schema::empty())))
    }

    /// Set the executed query string
    #[must_use]
    pub fn with_executed_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.meta.executed_query_string = query_string.into();
        self
    }

    /// Attach connector diagnostics
    #[must_use]
    pub fn with_custom_meta(mut self, custom: CustomMeta) -> Self {
        self.meta.custom = Some(custom);
        self
    }

    /// Number of fields
    pub fn num_fields(&self) -> usize {
        self.batch.num_columns()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Field names in order
    pub fn field_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// JSON rendering with schema, rows and metadata
    pub fn to_json(&self) -> Result<JsonValue> {
        let fields: Vec<JsonValue> = self
            .batch
            .schema()
            .fields()
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name(),
                    "type": f.data_type().to_string(),
                })
            })
            .collect();

        Ok(serde_json::json!({
            "name": self.name,
            "refId": self.ref_id,
            "schema": { "fields": fields },
            "rows": arrow_to_json(&self.batch)?,
            "meta": serde_json::to_value(&self.meta)?,
        }))
    }

    /// Tabular rendering for terminals
    pub fn pretty(&self) -> Result<String> {
        if self.num_fields() == 0 {
            return Ok(String::new());
        }
        let table = arrow::util::pretty::pretty_format_batches(std::slice::from_ref(&self.batch))?;
        Ok(table.to_string())
    }
}
