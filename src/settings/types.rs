//! Datasource settings types
//!
//! These types describe one configured datasource instance: how to
//! authenticate, which hosts may be contacted and how TLS is set up.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Timeout used when `timeoutInSeconds` is zero
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication method configured on the datasource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    /// No authentication
    #[default]
    #[serde(rename = "none", alias = "")]
    None,
    /// HTTP basic authentication
    #[serde(rename = "basicAuth")]
    BasicAuth,
    /// Static bearer token
    #[serde(rename = "bearerToken")]
    BearerToken,
    /// API key in a header or query parameter
    #[serde(rename = "apiKey")]
    ApiKey,
    /// OAuth2 (see [`OAuth2Settings::oauth2_type`])
    #[serde(rename = "oauth2")]
    OAuth2,
    /// Any other method handled outside this crate (e.g. forwarded credentials)
    #[serde(untagged)]
    Other(String),
}

impl AuthenticationMethod {
    /// Whether any authentication is configured
    pub fn is_configured(&self) -> bool {
        !matches!(self, AuthenticationMethod::None)
    }

    /// Label used for metrics and logs
    pub fn as_str(&self) -> &str {
        match self {
            AuthenticationMethod::None => "none",
            AuthenticationMethod::BasicAuth => "basicAuth",
            AuthenticationMethod::BearerToken => "bearerToken",
            AuthenticationMethod::ApiKey => "apiKey",
            AuthenticationMethod::OAuth2 => "oauth2",
            AuthenticationMethod::Other(s) => s,
        }
    }
}

/// OAuth2 grant flavour
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuth2Type {
    /// Client credentials grant
    #[default]
    ClientCredentials,
    /// JWT bearer assertion grant
    Jwt,
    /// Any other flow handled outside this crate
    #[serde(untagged)]
    Other(String),
}

impl OAuth2Type {
    /// Label used for metrics and logs
    pub fn as_str(&self) -> &str {
        match self {
            OAuth2Type::ClientCredentials => "client_credentials",
            OAuth2Type::Jwt => "jwt",
            OAuth2Type::Other(s) => s,
        }
    }
}

/// OAuth2 settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuth2Settings {
    /// Grant flavour
    #[serde(rename = "oauth2Type", alias = "oauth2_type")]
    pub oauth2_type: OAuth2Type,
    /// Client id (client credentials)
    pub client_id: String,
    /// Client secret (client credentials)
    pub client_secret: String,
    /// Token endpoint
    #[serde(alias = "token_url")]
    pub token_url: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Extra token request form parameters
    pub endpoint_params: HashMap<String, String>,
    /// Service account email, used as the JWT issuer
    pub email: String,
    /// PEM private key signing the JWT assertion
    pub private_key: String,
    /// Key id placed in the JWT header
    pub private_key_id: String,
    /// JWT subject (impersonated user)
    pub subject: String,
}

/// Where an API key is placed on outbound requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// HTTP header
    #[default]
    Header,
    /// URL query parameter
    Query,
}

/// Datasource settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Authentication method
    #[serde(alias = "auth_method")]
    pub authentication_method: AuthenticationMethod,

    /// Basic auth user name
    pub basic_auth_user: String,
    /// Basic auth password
    pub basic_auth_password: String,
    /// Static bearer token
    pub bearer_token: String,
    /// API key name
    pub api_key_key: String,
    /// API key value
    pub api_key_value: String,
    /// API key placement
    pub api_key_type: ApiKeyLocation,

    /// OAuth2 settings
    #[serde(rename = "oauth2")]
    pub oauth2: OAuth2Settings,

    /// Ordered list of URL prefixes requests may target
    pub allowed_hosts: Vec<String>,

    /// Skip server certificate verification
    pub insecure_skip_verify: bool,
    /// Expected server name for certificate verification
    pub server_name: String,
    /// Present a client certificate
    pub tls_client_auth: bool,
    /// Client certificate (PEM)
    pub tls_client_cert: String,
    /// Client private key (PEM)
    pub tls_client_key: String,
    /// Trust only the configured CA certificate
    #[serde(rename = "tlsAuthWithCACert")]
    pub tls_auth_with_ca_cert: bool,
    /// CA certificate (PEM)
    #[serde(rename = "tlsCACert")]
    pub tls_ca_cert: String,

    /// Request timeout in seconds (0 = default)
    pub timeout_in_seconds: u64,

    /// Headers added to every request; values may hold secrets
    pub custom_headers: HashMap<String, String>,
    /// Secrets referenced from queries as `${__qs.<name>}`
    pub secure_query_fields: HashMap<String, String>,
}

impl Settings {
    /// Parse settings from YAML or JSON text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load settings from a YAML or JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Effective request timeout
    pub fn timeout(&self) -> Duration {
        if self.timeout_in_seconds == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.timeout_in_seconds)
        }
    }

    /// Whether authentication is configured without any allowed host
    pub fn is_missing_allow_list(&self) -> bool {
        self.authentication_method.is_configured() && self.allowed_hosts.is_empty()
    }

    /// Whether the OAuth2 client credentials token layer is active
    pub fn uses_client_credentials(&self) -> bool {
        self.authentication_method == AuthenticationMethod::OAuth2
            && self.oauth2.oauth2_type == OAuth2Type::ClientCredentials
    }

    /// Whether the OAuth2 JWT token layer is active
    pub fn uses_jwt(&self) -> bool {
        self.authentication_method == AuthenticationMethod::OAuth2
            && self.oauth2.oauth2_type == OAuth2Type::Jwt
    }

    /// Combined auth label, e.g. `oauth2 client_credentials`
    pub fn auth_label(&self) -> String {
        if self.authentication_method == AuthenticationMethod::OAuth2 {
            format!(
                "{} {}",
                self.authentication_method.as_str(),
                self.oauth2.oauth2_type.as_str()
            )
        } else {
            self.authentication_method.as_str().to_string()
        }
    }
}
