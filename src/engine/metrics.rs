//! Query metrics
//!
//! The engine reports every query that passes validation to a
//! [`MetricsSink`]. The default sink drops the events; [`QueryCounter`]
//! keeps per-label totals in memory for hosts that want to read them.

use crate::query::Query;
use crate::settings::Settings;
use crate::types::RequestContext;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Labels attached to a query event
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLabels {
    /// Instance id (empty when unknown)
    pub instance_id: String,
    /// Instance uid
    pub instance_uid: String,
    /// Instance name
    pub instance_name: String,
    /// Query type
    #[serde(rename = "type")]
    pub query_type: String,
    /// Query source
    pub source: String,
    /// Requested format
    pub format: String,
    /// Authentication label, e.g. `oauth2 jwt`
    pub auth_type: String,
}

impl QueryLabels {
    /// Labels for a query run under the given settings
    pub fn new(ctx: &RequestContext, query: &Query, settings: &Settings) -> Self {
        let (instance_id, instance_uid, instance_name) = match &ctx.instance {
            Some(instance) => (
                instance.id.to_string(),
                instance.uid.clone(),
                instance.name.clone(),
            ),
            None => Default::default(),
        };
        Self {
            instance_id,
            instance_uid,
            instance_name,
            query_type: query.query_type.as_str().to_string(),
            source: query.source.as_str().to_string(),
            format: query.format.clone(),
            auth_type: settings.auth_label().trim().to_string(),
        }
    }
}

/// Receiver of query events
pub trait MetricsSink: Send + Sync {
    /// A query passed validation and is about to execute
    fn record_query(&self, labels: &QueryLabels);
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_query(&self, _labels: &QueryLabels) {}
}

/// In-memory counter of queries per label set
#[derive(Debug, Default)]
pub struct QueryCounter {
    counts: Mutex<BTreeMap<QueryLabels, u64>>,
}

/// One counter line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCount {
    /// Labels
    pub labels: QueryLabels,
    /// Number of queries
    pub count: u64,
}

impl QueryCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for one label set
    pub fn count(&self, labels: &QueryLabels) -> u64 {
        self.counts
            .lock()
            .map(|counts| counts.get(labels).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total across all label sets
    pub fn total(&self) -> u64 {
        self.counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Snapshot of every label set
    pub fn snapshot(&self) -> Vec<QueryCount> {
        self.counts
            .lock()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(labels, count)| QueryCount {
                        labels: labels.clone(),
                        count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MetricsSink for QueryCounter {
    fn record_query(&self, labels: &QueryLabels) {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(labels.clone()).or_insert(0) += 1;
        }
    }
}
