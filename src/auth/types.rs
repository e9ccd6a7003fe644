//! Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grant type of the JWT bearer assertion exchange
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed JWT assertion in seconds
pub const JWT_LIFETIME_SECS: i64 = 3600;

/// How a token layer obtains its access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// OAuth2 client credentials grant
    ClientCredentials {
        /// Token endpoint
        token_url: String,
        /// Client id
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Requested scopes (space-joined on the wire)
        scopes: Vec<String>,
        /// Extra form parameters
        endpoint_params: HashMap<String, String>,
    },

    /// Signed RS256 assertion exchanged for an access token
    JwtBearer {
        /// Token endpoint, also the assertion audience
        token_url: String,
        /// Issuer (service account email)
        email: String,
        /// Optional subject
        subject: Option<String>,
        /// PEM RSA private key
        private_key: String,
        /// Optional key id placed in the JWT header
        private_key_id: Option<String>,
        /// Requested scopes (space-joined into the `scope` claim)
        scopes: Vec<String>,
    },
}

impl TokenGrant {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            TokenGrant::ClientCredentials { .. } => "client_credentials",
            TokenGrant::JwtBearer { .. } => "jwt",
        }
    }

    /// Token endpoint of this grant
    pub fn token_url(&self) -> &str {
        match self {
            TokenGrant::ClientCredentials { token_url, .. }
            | TokenGrant::JwtBearer { token_url, .. } => token_url,
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

/// OAuth2 token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

/// Claims of the JWT bearer assertion
#[derive(Debug, Serialize)]
pub(crate) struct JwtClaims {
    pub iss: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub aud: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}
