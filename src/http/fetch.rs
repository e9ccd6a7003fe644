//! Fetch executor
//!
//! Runs one URL query: build, allow-list check, send, decode. Failures are
//! returned inside the [`FetchResult`] rather than as `Err`, so the caller
//! can still attach whatever was observed (status, duration, raw body) to
//! the frame metadata.

use super::client::AuthenticatedClient;
use super::request::{build_request, executed_url, target_url};
use crate::decode::{decode_body, BodyFormat, Payload};
use crate::error::Error;
use crate::query::Query;
use crate::security::is_url_allowed;
use crate::types::StringMap;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of one fetch
#[derive(Debug, Default)]
pub struct FetchResult {
    /// Decoded body, or the raw text when decoding failed
    pub payload: Payload,
    /// HTTP status, when a response (or a policy denial) was produced
    pub status: Option<u16>,
    /// Time spent sending and reading the body
    pub duration: Duration,
    /// Failure, if any
    pub error: Option<Error>,
}

impl FetchResult {
    fn failed(error: Error, status: Option<u16>, duration: Duration) -> Self {
        Self {
            payload: Payload::Empty,
            status,
            duration,
            error: Some(error),
        }
    }

    /// Whether the fetch produced a usable payload
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Execute a URL query
pub async fn execute(client: &AuthenticatedClient, query: &Query, headers: &StringMap) -> FetchResult {
    let settings = client.settings();

    let request = match build_request(settings, query, headers, true) {
        Ok(request) => request,
        Err(e) => {
            warn!(ref_id = %query.ref_id, error = %e, "Failed to build request");
            return FetchResult::failed(e, None, Duration::ZERO);
        }
    };

    if !is_url_allowed(&target_url(settings, query), &settings.allowed_hosts) {
        warn!(
            ref_id = %query.ref_id,
            url = %executed_url(settings, query),
            "Requested URL is not in the allowed hosts"
        );
        return FetchResult::failed(Error::Unauthorized, Some(401), Duration::ZERO);
    }

    let method = request.method.clone();
    let start = Instant::now();

    let response = match client.send(request).await {
        Ok(response) => response,
        Err(e) => {
            let duration = start.elapsed();
            warn!(ref_id = %query.ref_id, error = %e, "Request failed");
            let error = match e {
                Error::Http(_) => Error::network(executed_url(settings, query)),
                other => other,
            };
            return FetchResult::failed(error, None, duration);
        }
    };

    let status = response.status();
    if status.as_u16() >= 400 {
        let duration = start.elapsed();
        warn!(ref_id = %query.ref_id, status = status.as_u16(), "Upstream returned an error");
        return FetchResult::failed(Error::upstream(status), Some(status.as_u16()), duration);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let duration = start.elapsed();
            warn!(ref_id = %query.ref_id, error = %e, "Failed to read response body");
            return FetchResult::failed(
                Error::network(executed_url(settings, query)),
                Some(status.as_u16()),
                duration,
            );
        }
    };
    let duration = start.elapsed();

    debug!(
        ref_id = %query.ref_id,
        method = %method,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request succeeded"
    );

    let decoded = decode_body(
        BodyFormat::for_query_type(&query.query_type),
        content_type.as_deref(),
        body,
    );
    if let Some(e) = &decoded.error {
        warn!(ref_id = %query.ref_id, error = %e, "Failed to decode response body");
    }

    FetchResult {
        payload: decoded.payload,
        status: Some(status.as_u16()),
        duration,
        error: decoded.error,
    }
}
