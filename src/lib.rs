// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # urlframe
//!
//! Query execution core for data source connectors that read from URLs or
//! inline payloads and hand back columnar frames.
//!
//! ## Features
//!
//! - **Secure fetch**: host allow-list, TLS (client certs, CA pinning), timeouts
//! - **Authentication**: basic, bearer, API key, OAuth2 client credentials, JWT
//! - **Secrets**: `${__qs.name}` placeholders, redacted in everything shown to users
//! - **Root selection**: dot paths and JSONPath narrowing of JSON payloads
//! - **Arrow frames**: inferred or column-projected `RecordBatch` per query
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use urlframe::engine::{DataQuery, QueryDataRequest, QueryEngine};
//! use urlframe::{Result, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = QueryEngine::new(Settings::from_file("settings.yaml")?)?;
//!
//!     let request = QueryDataRequest::new(vec![DataQuery::new(
//!         "A",
//!         r#"{"source": "url", "type": "json-backend", "url": "https://api.example.com/users", "rootSelector": "data"}"#,
//!     )]);
//!     let response = engine.query_data(&request).await;
//!
//!     for (ref_id, data) in &response.responses {
//!         println!("{ref_id}: {}", data.to_json()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  QueryEngine::query_data(batch)                 │
//! │  decode → allow-list precheck → interpolate → execute → frame   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Security │   Auth    │     HTTP      │  Extract  │   Frame     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Allow    │ OAuth2 CC │ Request build │ Dot path  │ Arrow       │
//! │ list     │ JWT       │ Secrets       │ JSONPath  │ Columns     │
//! │ TLS      │ Cache     │ Fetch/decode  │           │ Metadata    │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Datasource settings
pub mod settings;

/// Query model and macro interpolation
pub mod query;

/// Secret placeholders
pub mod template;

/// Host allow-list and TLS
pub mod security;

/// OAuth2 token layers
pub mod auth;

/// Authenticated transport, request building and fetch
pub mod http;

/// Response body decoding
pub mod decode;

/// Root selectors
pub mod extract;

/// Arrow frames and metadata
pub mod frame;

/// Frame assembler
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{check_health, DataQuery, QueryDataRequest, QueryDataResponse, QueryEngine};
pub use frame::{Frame, Framer};
pub use query::{Interpolator, Query};
pub use settings::Settings;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
