//! HTTP module
//!
//! Outbound side of a URL query.
//!
//! # Features
//!
//! - **Authenticated transport**: TLS, proxy, timeout and OAuth2 token layers
//! - **Request building**: method, body, params, header precedence, secrets
//! - **Fetch execution**: allow-list gate, timing, status and body decoding

mod client;
mod fetch;
mod request;

pub use client::{build_client, AuthenticatedClient, USER_AGENT};
pub use fetch::{execute, FetchResult};
pub use request::{
    build_request, executed_url, target_url, OutboundRequest, GRAPHQL_CONTENT_TYPE,
};
