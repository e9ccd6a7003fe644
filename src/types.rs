//! Common types used throughout urlframe
//!
//! This module contains shared type definitions, type aliases,
//! and small value types used across multiple modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
///
/// `serde_json::Value` is the tagged Null | Bool | Number | String | Array |
/// Object variant threaded through fetch, extraction and framing.
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Time Range
// ============================================================================

/// Time range a query is evaluated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Range start
    pub from: DateTime<Utc>,
    /// Range end
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The last `hours` hours up to now
    pub fn last_hours(hours: i64) -> Self {
        let to = Utc::now();
        Self {
            from: to - chrono::Duration::hours(hours),
            to,
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::last_hours(6)
    }
}

// ============================================================================
// Request-scoped Context
// ============================================================================

/// Identity of the datasource instance serving a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Numeric instance id
    #[serde(default)]
    pub id: i64,
    /// Instance uid
    #[serde(default)]
    pub uid: String,
    /// Human-readable instance name
    #[serde(default)]
    pub name: String,
}

/// Parameters scoped to one batch request, passed explicitly down the call chain
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Instance serving the request, when the host supplied one
    pub instance: Option<InstanceInfo>,
    /// Headers supplied by the caller, forwarded on outbound requests
    pub headers: StringMap,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instance identity
    #[must_use]
    pub fn with_instance(mut self, instance: InstanceInfo) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Add a caller-supplied header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_last_hours() {
        let range = TimeRange::last_hours(2);
        assert_eq!(range.to - range.from, chrono::Duration::hours(2));
    }

    #[test]
    fn test_time_range_serde() {
        let json = r#"{"from":"2024-01-01T00:00:00Z","to":"2024-01-02T00:00:00Z"}"#;
        let range: TimeRange = serde_json::from_str(json).unwrap();
        assert_eq!(range.from.timestamp(), 1_704_067_200);
        assert_eq!(range.to.timestamp(), 1_704_153_600);
    }

    #[test]
    fn test_request_context_builder() {
        let ctx = RequestContext::new()
            .with_instance(InstanceInfo {
                id: 7,
                uid: "abc".to_string(),
                name: "prod".to_string(),
            })
            .header("X-Request-Id", "r1");

        assert_eq!(ctx.instance.unwrap().id, 7);
        assert_eq!(ctx.headers.get("X-Request-Id"), Some(&"r1".to_string()));
    }
}
