//! Query model
//!
//! The declarative description of one query as sent by the caller.
//! Field names follow the wire format (camelCase); the snake_case names
//! used by older query documents are accepted as aliases.

use serde::{Deserialize, Serialize};

/// Where the query reads its data from
///
/// A query without a `source` is answered with metadata only and never
/// touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    /// Fetch from `url`
    Url,
    /// Use the literal `data` payload
    Inline,
    /// Any other source, answered with metadata only
    #[serde(untagged)]
    Other(String),
}

impl Default for QuerySource {
    fn default() -> Self {
        QuerySource::Other(String::new())
    }
}

impl QuerySource {
    /// Wire name of the source
    pub fn as_str(&self) -> &str {
        match self {
            QuerySource::Url => "url",
            QuerySource::Inline => "inline",
            QuerySource::Other(s) => s,
        }
    }
}

/// Declared payload type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryType {
    /// JSON, parsed downstream
    #[default]
    Json,
    /// CSV text
    Csv,
    /// TSV text
    Tsv,
    /// XML text
    Xml,
    /// HTML text
    Html,
    /// GraphQL over HTTP POST
    #[serde(rename = "graphql")]
    GraphQl,
    /// UQL evaluated downstream
    Uql,
    /// GROQ evaluated downstream
    Groq,
    /// JSON framed by this crate
    JsonBackend,
    /// Any other type
    #[serde(untagged)]
    Other(String),
}

impl QueryType {
    /// Wire name of the type
    pub fn as_str(&self) -> &str {
        match self {
            QueryType::Json => "json",
            QueryType::Csv => "csv",
            QueryType::Tsv => "tsv",
            QueryType::Xml => "xml",
            QueryType::Html => "html",
            QueryType::GraphQl => "graphql",
            QueryType::Uql => "uql",
            QueryType::Groq => "groq",
            QueryType::JsonBackend => "json-backend",
            QueryType::Other(s) => s,
        }
    }

    /// Whether the response body is always decoded as JSON
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            QueryType::Json | QueryType::GraphQl | QueryType::JsonBackend
        )
    }

    /// Whether the body is decoded as JSON only when the server says so
    pub fn is_json_when_declared(&self) -> bool {
        matches!(self, QueryType::Uql | QueryType::Groq)
    }

    /// Whether results are converted to columnar frames by this crate
    pub fn requires_framing(&self) -> bool {
        matches!(self, QueryType::JsonBackend)
    }
}

/// A key/value pair (query parameter or header)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Name
    #[serde(default)]
    pub key: String,
    /// Value
    #[serde(default)]
    pub value: String,
}

impl KeyValue {
    /// Create a new pair
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// HTTP options of a URL query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlOptions {
    /// HTTP method, case-insensitive; anything but POST means GET
    pub method: String,
    /// Request body (POST only)
    pub data: String,
    /// Extra query parameters
    pub params: Vec<KeyValue>,
    /// Extra headers
    pub headers: Vec<KeyValue>,
    /// Content type of the body
    #[serde(alias = "body_content_type")]
    pub body_content_type: String,
}

impl UrlOptions {
    /// Whether the request is sent as a POST
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

/// Column projection applied by the framer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnDef {
    /// Dot path selecting the value in each row
    pub selector: String,
    /// Output column name (defaults to the selector)
    pub text: String,
    /// Target type: string, number, timestamp, timestamp_epoch, boolean
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ColumnDef {
    /// Column name used in the frame
    pub fn name(&self) -> &str {
        if self.text.is_empty() {
            &self.selector
        } else {
            &self.text
        }
    }
}

/// One query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    /// Caller-assigned query id
    pub ref_id: String,
    /// Declared payload type
    #[serde(rename = "type")]
    pub query_type: QueryType,
    /// Data source
    pub source: QuerySource,
    /// Requested output format (passed through)
    pub format: String,
    /// Target URL (url source)
    pub url: String,
    /// HTTP options (url source)
    #[serde(alias = "url_options")]
    pub url_options: UrlOptions,
    /// Path narrowing the payload before framing
    #[serde(alias = "root_selector")]
    pub root_selector: String,
    /// Literal payload (inline source)
    pub data: String,
    /// Column projection
    pub columns: Vec<ColumnDef>,
}

impl Query {
    /// Create a URL query
    pub fn from_url(
        ref_id: impl Into<String>,
        query_type: QueryType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_type,
            source: QuerySource::Url,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Create an inline query
    pub fn from_inline(
        ref_id: impl Into<String>,
        query_type: QueryType,
        data: impl Into<String>,
    ) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_type,
            source: QuerySource::Inline,
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the root selector
    #[must_use]
    pub fn with_root_selector(mut self, selector: impl Into<String>) -> Self {
        self.root_selector = selector.into();
        self
    }

    /// Make this a POST with the given body
    #[must_use]
    pub fn with_post_body(mut self, body: impl Into<String>) -> Self {
        self.url_options.method = "POST".to_string();
        self.url_options.data = body.into();
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_options.params.push(KeyValue::new(key, value));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_options.headers.push(KeyValue::new(key, value));
        self
    }
}
