//! Engine types
//!
//! Batch envelope for the frame assembler: requests, per-query responses
//! and health check results.

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::types::{JsonObject, JsonValue, RequestContext, TimeRange};
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Requests
// ============================================================================

/// One query of a batch, as received from the caller
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    /// Caller-assigned query id
    pub ref_id: String,
    /// Range the query is evaluated over
    pub time_range: TimeRange,
    /// Raw query JSON, decoded by the engine
    pub json: String,
}

impl DataQuery {
    /// Create a data query from raw JSON text
    pub fn new(ref_id: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            time_range: TimeRange::default(),
            json: json.into(),
        }
    }

    /// Create a data query from a query object, taking the refId from it
    pub fn from_value(value: &JsonValue) -> Self {
        let ref_id = value
            .get("refId")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        Self::new(ref_id, value.to_string())
    }

    /// Set the time range
    #[must_use]
    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }
}

/// A batch of queries sharing one request context
#[derive(Debug, Clone, Default)]
pub struct QueryDataRequest {
    /// Request-scoped parameters
    pub context: RequestContext,
    /// Queries to run
    pub queries: Vec<DataQuery>,
}

impl QueryDataRequest {
    /// Create a request
    pub fn new(queries: Vec<DataQuery>) -> Self {
        Self {
            context: RequestContext::default(),
            queries,
        }
    }

    /// Set the request context
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Result of one query
#[derive(Debug)]
pub struct DataResponse {
    /// Frames produced (exactly one)
    pub frames: Vec<Frame>,
    /// Error that aborted the query before execution
    pub error: Option<Error>,
}

impl DataResponse {
    /// A response carrying one frame
    pub fn new(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
            error: None,
        }
    }

    /// A response for a query that never ran
    pub fn failed(ref_id: &str, error: Error) -> Self {
        Self {
            frames: vec![Frame::empty(ref_id)],
            error: Some(error),
        }
    }

    /// The frame of this response
    pub fn frame(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Whether the query ran
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Render as `{frames, error}`
    pub fn to_json(&self) -> Result<JsonValue> {
        let frames = self
            .frames
            .iter()
            .map(Frame::to_json)
            .collect::<Result<Vec<_>>>()?;
        Ok(serde_json::json!({
            "frames": frames,
            "error": self.error.as_ref().map(ToString::to_string),
        }))
    }
}

/// Results of a batch, keyed by refId
#[derive(Debug, Default)]
pub struct QueryDataResponse {
    /// One response per refId
    pub responses: BTreeMap<String, DataResponse>,
}

impl QueryDataResponse {
    /// Response for a refId
    pub fn get(&self, ref_id: &str) -> Option<&DataResponse> {
        self.responses.get(ref_id)
    }

    /// Number of responses
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether there are no responses
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Number of queries that failed before execution
    pub fn error_count(&self) -> usize {
        self.responses.values().filter(|r| !r.is_ok()).count()
    }

    /// Render as `{refId: {frames, error}}`
    pub fn to_json(&self) -> Result<JsonValue> {
        let mut out = JsonObject::new();
        for (ref_id, response) in &self.responses {
            out.insert(ref_id.clone(), response.to_json()?);
        }
        Ok(JsonValue::Object(out))
    }
}

// ============================================================================
// Health
// ============================================================================

/// Outcome of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Settings are usable
    Ok,
    /// Settings are not usable
    Error,
}

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckHealthResult {
    /// Status
    pub status: HealthStatus,
    /// Message shown to the user
    pub message: String,
}

impl CheckHealthResult {
    /// Healthy result
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            message: message.into(),
        }
    }

    /// Unhealthy result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }

    /// Whether the check passed
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
