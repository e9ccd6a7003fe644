//! Query batch documents
//!
//! The shape shared by the `query` command's input file and the server's
//! `POST /query` body: `{queries: [...], range?: {from, to}, headers?: {...}}`.
//! Query files may also be a bare list of query objects.

use crate::engine::{DataQuery, QueryDataRequest};
use crate::error::{Error, Result, ResultExt};
use crate::types::{JsonValue, RequestContext, StringMap, TimeRange};
use serde::Deserialize;
use std::path::Path;

/// A batch of raw query objects plus request-scoped parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryBatch {
    /// Query objects, each carrying its own `refId`
    #[serde(default)]
    pub queries: Vec<JsonValue>,
    /// Range shared by every query
    #[serde(default)]
    pub range: Option<TimeRange>,
    /// Caller headers forwarded on outbound requests
    #[serde(default)]
    pub headers: StringMap,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryDocument {
    List(Vec<JsonValue>),
    Batch(QueryBatch),
}

impl QueryBatch {
    /// Parse a YAML or JSON document
    pub fn parse(content: &str) -> Result<Self> {
        let document: QueryDocument = serde_yaml::from_str(content)?;
        Ok(match document {
            QueryDocument::List(queries) => Self {
                queries,
                ..Default::default()
            },
            QueryDocument::Batch(batch) => batch,
        })
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read queries file {}", path.display()))?;
        Self::parse(&content)
    }

    /// Override the range
    #[must_use]
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Build the engine request
    pub fn into_request(self) -> QueryDataRequest {
        let range = self.range.unwrap_or_default();
        let queries = self
            .queries
            .iter()
            .map(|query| DataQuery::from_value(query).with_time_range(range))
            .collect();
        let context = RequestContext {
            instance: None,
            headers: self.headers,
        };
        QueryDataRequest::new(queries).with_context(context)
    }
}

/// Parse a `--from`/`--to` bound (RFC 3339 or epoch milliseconds)
pub fn parse_time(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    if let Ok(millis) = value.parse::<i64>() {
        return chrono::DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| Error::config(format!("Time out of range: {value}")));
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&chrono::Utc))
        .map_err(|e| Error::config(format!("Invalid time '{value}': {e}")))
}
