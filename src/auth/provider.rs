//! Token provider implementation
//!
//! Obtains access tokens for one grant and caches them until shortly
//! before they expire.

use super::types::{
    CachedToken, JwtClaims, TokenGrant, TokenResponse, JWT_BEARER_GRANT, JWT_LIFETIME_SECS,
};
use crate::error::{Error, Result};
use crate::settings::{OAuth2Settings, Settings};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A token layer: one grant plus its token cache
#[derive(Clone)]
pub struct TokenProvider {
    /// Grant configuration
    grant: TokenGrant,
    /// Cached token, shared between clones
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl TokenProvider {
    /// Create a new provider for the given grant
    pub fn new(grant: TokenGrant) -> Self {
        Self::with_client(grant, Client::new())
    }

    /// Create a provider with a custom HTTP client
    pub fn with_client(grant: TokenGrant, http_client: Client) -> Self {
        Self {
            grant,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Client credentials grant from OAuth2 settings
    pub fn client_credentials(oauth2: &OAuth2Settings) -> TokenGrant {
        TokenGrant::ClientCredentials {
            token_url: oauth2.token_url.clone(),
            client_id: oauth2.client_id.clone(),
            client_secret: oauth2.client_secret.clone(),
            scopes: oauth2.scopes.clone(),
            endpoint_params: oauth2.endpoint_params.clone(),
        }
    }

    /// JWT bearer grant from OAuth2 settings
    pub fn jwt(oauth2: &OAuth2Settings) -> TokenGrant {
        TokenGrant::JwtBearer {
            token_url: oauth2.token_url.clone(),
            email: oauth2.email.clone(),
            subject: Some(oauth2.subject.clone()).filter(|s| !s.is_empty()),
            private_key: oauth2.private_key.clone(),
            private_key_id: Some(oauth2.private_key_id.clone()).filter(|s| !s.is_empty()),
            scopes: oauth2.scopes.clone(),
        }
    }

    /// The grant this provider serves
    pub fn grant(&self) -> &TokenGrant {
        &self.grant
    }

    /// Get a valid token, refreshing if necessary
    pub async fn token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        debug!(grant = self.grant.label(), "Refreshing access token");
        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Clear the cached token, forcing a refresh on next use
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.grant {
            TokenGrant::ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
                endpoint_params,
            } => {
                let mut form = vec![
                    ("grant_type", "client_credentials".to_string()),
                    ("client_id", client_id.clone()),
                    ("client_secret", client_secret.clone()),
                ];
                if !scopes.is_empty() {
                    form.push(("scope", scopes.join(" ")));
                }
                for (key, value) in endpoint_params {
                    form.push((key.as_str(), value.clone()));
                }

                let response = self
                    .http_client
                    .post(token_url)
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| Error::OAuth2 {
                        message: format!("Token request failed: {e}"),
                    })?;

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::OAuth2 {
                        message: format!("Token request failed with status {status}: {body}"),
                    });
                }

                let token_response: TokenResponse =
                    response.json().await.map_err(|e| Error::OAuth2 {
                        message: format!("Invalid token response: {e}"),
                    })?;
                Ok(token_response.into_cached_token())
            }

            TokenGrant::JwtBearer {
                token_url,
                email,
                subject,
                private_key,
                private_key_id,
                scopes,
            } => {
                let assertion = sign_assertion(
                    token_url,
                    email,
                    subject.as_deref(),
                    private_key,
                    private_key_id.as_deref(),
                    scopes,
                )?;
                let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

                let response = self
                    .http_client
                    .post(token_url)
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| Error::JwtGeneration {
                        message: format!("JWT token exchange failed: {e}"),
                    })?;

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::JwtGeneration {
                        message: format!("JWT token exchange failed with status {status}: {body}"),
                    });
                }

                let token_response: TokenResponse =
                    response.json().await.map_err(|e| Error::JwtGeneration {
                        message: format!("Invalid token response: {e}"),
                    })?;
                Ok(token_response.into_cached_token())
            }
        }
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("grant", &self.grant.label())
            .field("token_url", &self.grant.token_url())
            .finish_non_exhaustive()
    }
}

/// Sign the RS256 assertion for the JWT bearer grant
fn sign_assertion(
    audience: &str,
    issuer: &str,
    subject: Option<&str>,
    private_key: &str,
    key_id: Option<&str>,
    scopes: &[String],
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        iss: issuer.to_string(),
        sub: subject.map(String::from),
        aud: audience.to_string(),
        scope: scopes.join(" "),
        iat: now,
        exp: now + JWT_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key_id.map(String::from);

    let encoding_key =
        EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| Error::JwtGeneration {
            message: format!("Invalid private key: {e}"),
        })?;

    encode(&header, &claims, &encoding_key).map_err(|e| Error::JwtGeneration {
        message: format!("Failed to encode JWT: {e}"),
    })
}

/// Token layers active for the settings, in application order
///
/// Client credentials comes first, then JWT. Each layer overwrites the
/// `Authorization` header, so the last active layer wins.
pub fn token_layers(settings: &Settings, http_client: &Client) -> Vec<TokenProvider> {
    let mut layers = Vec::new();
    if settings.uses_client_credentials() {
        layers.push(TokenProvider::with_client(
            TokenProvider::client_credentials(&settings.oauth2),
            http_client.clone(),
        ));
    }
    if settings.uses_jwt() {
        layers.push(TokenProvider::with_client(
            TokenProvider::jwt(&settings.oauth2),
            http_client.clone(),
        ));
    }
    layers
}
