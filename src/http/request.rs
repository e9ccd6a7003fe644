//! Outbound request construction
//!
//! Builds the concrete HTTP request for a URL query: method, body, URL with
//! query parameters, and headers, with `${__qs.<name>}` placeholders resolved
//! either to real secrets or to the redaction string.

use crate::error::{Error, Result};
use crate::query::{Query, QueryType};
use crate::settings::{ApiKeyLocation, AuthenticationMethod, Settings};
use crate::template::{render_secure_fields, SecretMode, REDACTED};
use crate::types::StringMap;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

/// Content type used for GraphQL bodies
pub const GRAPHQL_CONTENT_TYPE: &str = "application/json";

/// A fully built request, ready to send
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// GET or POST
    pub method: Method,
    /// Final URL including query parameters
    pub url: Url,
    /// Headers after precedence rules were applied
    pub headers: HeaderMap,
    /// Body (POST only)
    pub body: Option<String>,
}

impl OutboundRequest {
    /// Header value as a string, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Build the outbound request for a URL query
///
/// Headers are layered with later sources overriding earlier ones:
/// caller headers, body content type, settings custom headers, query
/// headers, then the static auth header. Secret placeholders are resolved
/// in caller and query header values alike.
pub fn build_request(
    settings: &Settings,
    query: &Query,
    headers: &StringMap,
    include_secrets: bool,
) -> Result<OutboundRequest> {
    let mode = SecretMode::from_include(include_secrets);
    let render = |input: &str| render_secure_fields(input, &settings.secure_query_fields, mode);
    let options = &query.url_options;

    // URL and query parameters
    let mut url = Url::parse(&render(&query.url))?;
    let mut pairs: Vec<(String, String)> = options
        .params
        .iter()
        .filter(|p| !p.key.is_empty())
        .map(|p| (p.key.clone(), render(&p.value)))
        .collect();
    if settings.authentication_method == AuthenticationMethod::ApiKey
        && settings.api_key_type == ApiKeyLocation::Query
        && !settings.api_key_key.is_empty()
    {
        pairs.push((
            settings.api_key_key.clone(),
            mode.reveal(&settings.api_key_value).to_string(),
        ));
    }
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    // Method and body
    let (method, body) = if options.is_post() {
        let data = render(&options.data);
        let body = if query.query_type == QueryType::GraphQl {
            serde_json::json!({ "query": data }).to_string()
        } else {
            data
        };
        (Method::POST, Some(body))
    } else {
        (Method::GET, None)
    };

    // Headers
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        insert_header(&mut header_map, name, &render(value))?;
    }

    if method == Method::POST {
        if !options.body_content_type.is_empty() {
            insert_header(&mut header_map, CONTENT_TYPE.as_str(), &options.body_content_type)?;
        } else if query.query_type == QueryType::GraphQl {
            insert_header(&mut header_map, CONTENT_TYPE.as_str(), GRAPHQL_CONTENT_TYPE)?;
        }
    }

    for (name, value) in &settings.custom_headers {
        insert_header(&mut header_map, name, mode.reveal(value))?;
    }

    for header in options.headers.iter().filter(|h| !h.key.is_empty()) {
        insert_header(&mut header_map, &header.key, &render(&header.value))?;
    }

    if let Some((name, value)) = static_auth_header(settings, mode) {
        insert_header(&mut header_map, &name, &value)?;
    }

    Ok(OutboundRequest {
        method,
        url,
        headers: header_map,
        body,
    })
}

/// URL checked against the allow-list
///
/// `query.url` with secrets substituted and nothing else: no parameters
/// appended and no normalization, so an explicit default port or an
/// uppercase host is compared as written.
pub fn target_url(settings: &Settings, query: &Query) -> String {
    render_secure_fields(&query.url, &settings.secure_query_fields, SecretMode::Include)
}

/// Redacted final URL of a query, as shown to users
pub fn executed_url(settings: &Settings, query: &Query) -> String {
    match build_request(settings, query, &StringMap::new(), false) {
        Ok(request) => request.url.to_string(),
        Err(_) => render_secure_fields(
            &query.url,
            &settings.secure_query_fields,
            SecretMode::Redact,
        ),
    }
}

/// Static credential header for basic, bearer and header API key auth
fn static_auth_header(settings: &Settings, mode: SecretMode) -> Option<(String, String)> {
    match settings.authentication_method {
        AuthenticationMethod::BasicAuth => {
            let value = match mode {
                SecretMode::Include => base64::engine::general_purpose::STANDARD.encode(format!(
                    "{}:{}",
                    settings.basic_auth_user, settings.basic_auth_password
                )),
                SecretMode::Redact => REDACTED.to_string(),
            };
            Some((AUTHORIZATION.to_string(), format!("Basic {value}")))
        }
        AuthenticationMethod::BearerToken => Some((
            AUTHORIZATION.to_string(),
            format!("Bearer {}", mode.reveal(&settings.bearer_token)),
        )),
        AuthenticationMethod::ApiKey
            if settings.api_key_type == ApiKeyLocation::Header
                && !settings.api_key_key.is_empty() =>
        {
            Some((
                settings.api_key_key.clone(),
                mode.reveal(&settings.api_key_value).to_string(),
            ))
        }
        _ => None,
    }
}

fn insert_header(map: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::Other(format!("invalid header name: {name}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| Error::Other(format!("invalid value for header {name}")))?;
    map.insert(header_name, header_value);
    Ok(())
}
