//! Authenticated HTTP client
//!
//! Wraps a `reqwest` client configured from datasource settings:
//! - TLS (skip-verify, client certificate, pinned CA)
//! - System proxy from the environment
//! - Request timeout
//! - OAuth2 token layers setting the `Authorization` header

use super::request::OutboundRequest;
use crate::auth::{token_layers, TokenProvider};
use crate::error::{Error, Result};
use crate::security::build_tls_config;
use crate::settings::Settings;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use std::sync::Arc;
use tracing::debug;

/// User agent sent on every request
pub const USER_AGENT: &str = concat!("urlframe/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one datasource's settings
///
/// Cheap to clone; clones share the connection pool and token caches.
#[derive(Clone)]
pub struct AuthenticatedClient {
    client: Client,
    layers: Vec<TokenProvider>,
    settings: Arc<Settings>,
}

impl AuthenticatedClient {
    /// Build a client from settings
    ///
    /// Fails with [`Error::InvalidCredential`] when TLS material is unusable.
    pub fn new(settings: Settings) -> Result<Self> {
        let tls = build_tls_config(&settings)?;

        let builder = Client::builder()
            .timeout(settings.timeout())
            .user_agent(USER_AGENT);
        let client = tls.apply(builder).build().map_err(Error::Http)?;

        // Token requests go through the same transport (TLS, proxy, timeout)
        let layers = token_layers(&settings, &client);

        debug!(
            auth = %settings.auth_label(),
            token_layers = layers.len(),
            timeout_secs = settings.timeout().as_secs(),
            "Built HTTP client"
        );

        Ok(Self {
            client,
            layers,
            settings: Arc::new(settings),
        })
    }

    /// Settings this client was built from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Active token layers, in application order
    pub fn token_layers(&self) -> &[TokenProvider] {
        &self.layers
    }

    /// Send a built request
    ///
    /// Each token layer overwrites the `Authorization` header in turn.
    /// Transport failures are returned as [`Error::Http`]; token failures
    /// keep their own variant.
    pub async fn send(&self, request: OutboundRequest) -> Result<Response> {
        let OutboundRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        for layer in &self.layers {
            let token = layer.token().await?;
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::OAuth2 {
                    message: "token is not a valid header value".to_string(),
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut req = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            req = req.body(body);
        }

        req.send().await.map_err(Error::Http)
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("auth", &self.settings.auth_label())
            .field("token_layers", &self.layers)
            .finish_non_exhaustive()
    }
}

/// Build an authenticated client from settings
pub fn build_client(settings: &Settings) -> Result<AuthenticatedClient> {
    AuthenticatedClient::new(settings.clone())
}
