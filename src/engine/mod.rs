//! Frame assembler
//!
//! Runs a batch of queries and turns each into exactly one frame.
//!
//! # Overview
//!
//! For every query, independently and concurrently:
//! 1. Decode the query JSON
//! 2. Reject URL queries when auth is configured without allowed hosts
//! 3. Resolve time-range macros
//! 4. Report the query to the metrics sink
//! 5. Execute it (`url`), echo it (`inline`) or answer with metadata only
//! 6. For `json-backend`, narrow with the root selector and build columns
//!
//! Steps 1-3 fail the query with a response-level error. Anything later is
//! recorded in the frame's custom metadata and the frame is still returned.

mod metrics;
mod types;

pub use metrics::{MetricsSink, NoopMetrics, QueryCount, QueryCounter, QueryLabels};
pub use types::{
    CheckHealthResult, DataQuery, DataResponse, HealthStatus, QueryDataRequest,
    QueryDataResponse,
};

use crate::error::{Error, Result};
use crate::extract::{apply_root_selector, apply_root_selector_text};
use crate::frame::{
    ArrowFramer, CustomMeta, Frame, Framer, FramerOptions, NOT_AVAILABLE_QUERY_STRING,
};
use crate::http::{execute, executed_url, AuthenticatedClient};
use crate::query::{Interpolator, MacroInterpolator, Query, QuerySource};
use crate::settings::Settings;
use crate::types::{JsonValue, RequestContext};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Health message when auth is configured without allowed hosts
pub const HEALTH_MISSING_ALLOWED_HOSTS: &str =
    "Configure allowed hosts in the authentication section";

/// Query engine for one datasource instance
#[derive(Clone)]
pub struct QueryEngine {
    /// Transport shared by every query
    client: AuthenticatedClient,
    /// Macro resolution
    interpolator: Arc<dyn Interpolator>,
    /// JSON to columns
    framer: Arc<dyn Framer>,
    /// Query events
    metrics: Arc<dyn MetricsSink>,
}

impl QueryEngine {
    /// Create an engine for the given settings
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self::from_client(AuthenticatedClient::new(settings)?))
    }

    /// Create an engine around an existing client
    pub fn from_client(client: AuthenticatedClient) -> Self {
        Self {
            client,
            interpolator: Arc::new(MacroInterpolator::new()),
            framer: Arc::new(ArrowFramer::new()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replace the macro interpolator
    #[must_use]
    pub fn with_interpolator(mut self, interpolator: Arc<dyn Interpolator>) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Replace the framer
    #[must_use]
    pub fn with_framer(mut self, framer: Arc<dyn Framer>) -> Self {
        self.framer = framer;
        self
    }

    /// Replace the metrics sink
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Settings this engine runs with
    pub fn settings(&self) -> &Settings {
        self.client.settings()
    }

    /// Run a batch; one response per query, keyed by refId
    ///
    /// Queries sharing a refId overwrite each other; the last one wins.
    pub async fn query_data(&self, request: &QueryDataRequest) -> QueryDataResponse {
        let start = Instant::now();
        let results = join_all(
            request
                .queries
                .iter()
                .map(|query| self.query(query, &request.context)),
        )
        .await;

        let mut response = QueryDataResponse::default();
        for (query, result) in request.queries.iter().zip(results) {
            response.responses.insert(query.ref_id.clone(), result);
        }

        info!(
            queries = request.queries.len(),
            errors = response.error_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Query batch complete"
        );
        response
    }

    /// Run one query
    pub async fn query(&self, data_query: &DataQuery, ctx: &RequestContext) -> DataResponse {
        let query = match self.prepare(data_query) {
            Ok(query) => query,
            Err(e) => return DataResponse::failed(&data_query.ref_id, e),
        };

        self.metrics
            .record_query(&QueryLabels::new(ctx, &query, self.settings()));

        let source = query.source.clone();
        let frame = match source {
            QuerySource::Url => self.url_frame(query, ctx).await,
            QuerySource::Inline => self.inline_frame(query),
            QuerySource::Other(source) => {
                debug!(ref_id = %query.ref_id, source = %source, "Source answered with metadata only");
                Frame::empty(&query.ref_id)
                    .with_executed_query_string(NOT_AVAILABLE_QUERY_STRING)
                    .with_custom_meta(CustomMeta::new(query))
            }
        };
        DataResponse::new(frame)
    }

    /// Decode, validate and interpolate
    fn prepare(&self, data_query: &DataQuery) -> Result<Query> {
        let mut query: Query = serde_json::from_str(&data_query.json).map_err(|e| {
            error!(ref_id = %data_query.ref_id, error = %e, "Error un-marshaling the query");
            Error::query_decode(e.to_string())
        })?;
        if !data_query.ref_id.is_empty() {
            query.ref_id.clone_from(&data_query.ref_id);
        }

        if query.source == QuerySource::Url && self.settings().is_missing_allow_list() {
            warn!(ref_id = %query.ref_id, "Authentication configured without allowed hosts");
            return Err(Error::MissingAllowList);
        }

        self.interpolator
            .interpolate(query, &data_query.time_range)
            .inspect_err(|e| {
                error!(ref_id = %data_query.ref_id, error = %e, "Error applying macros");
            })
    }

    async fn url_frame(&self, query: Query, ctx: &RequestContext) -> Frame {
        let fetch = execute(&self.client, &query, &ctx.headers).await;
        let executed = executed_url(self.settings(), &query);

        let mut frame = Frame::empty(&query.ref_id);
        let mut data = fetch.payload.to_value();
        let mut failure = fetch.error;

        if failure.is_none() && query.query_type.requires_framing() {
            match apply_root_selector(&fetch.payload, &query.root_selector) {
                Ok(selected) => {
                    match self.build_frame(&query, &selected) {
                        Ok(built) => frame = built,
                        Err(e) => failure = Some(e),
                    }
                    data = selected;
                }
                Err(e) => failure = Some(e),
            }
        }

        let mut custom = CustomMeta::new(query);
        custom.data = data;
        custom.response_code_from_server = fetch.status.unwrap_or(0);
        custom.duration = fetch.duration;
        if let Some(e) = &failure {
            warn!(ref_id = %custom.query.ref_id, error = %e, "Error getting response for query");
            custom.set_error(e);
        }

        frame
            .with_executed_query_string(executed)
            .with_custom_meta(custom)
    }

    fn inline_frame(&self, query: Query) -> Frame {
        let mut frame = Frame::empty(&query.ref_id);
        let mut failure = None;

        if query.query_type.requires_framing() {
            match apply_root_selector_text(&query.data, &query.root_selector)
                .and_then(|selected| self.build_frame(&query, &selected))
            {
                Ok(built) => frame = built,
                Err(e) => {
                    warn!(ref_id = %query.ref_id, error = %e, "Error building inline frame");
                    failure = Some(e);
                }
            }
        }

        let data = JsonValue::String(query.data.clone());
        let mut custom = CustomMeta::new(query);
        custom.data = data;
        if let Some(e) = &failure {
            custom.set_error(e);
        }

        frame
            .with_executed_query_string(NOT_AVAILABLE_QUERY_STRING)
            .with_custom_meta(custom)
    }

    fn build_frame(&self, query: &Query, value: &JsonValue) -> Result<Frame> {
        self.framer
            .to_frame(&query.ref_id, value, &FramerOptions::from_query(query))
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

/// Check whether settings are usable
pub fn check_health(settings: &Settings) -> CheckHealthResult {
    if settings.is_missing_allow_list() {
        return CheckHealthResult::error(HEALTH_MISSING_ALLOWED_HOSTS);
    }
    match AuthenticatedClient::new(settings.clone()) {
        Ok(_) => CheckHealthResult::ok("OK"),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            CheckHealthResult::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests;
