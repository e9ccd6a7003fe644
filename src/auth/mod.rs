//! Authentication module
//!
//! Supports the OAuth2 token layers: client credentials and JWT bearer
//! assertion. Static credentials (basic, bearer, API key) are plain headers
//! and are applied by the request builder.
//!
//! Each `TokenProvider` caches its token and refreshes it shortly before
//! expiry.

mod provider;
mod types;

pub use provider::{token_layers, TokenProvider};
pub use types::{CachedToken, TokenGrant, JWT_BEARER_GRANT, JWT_LIFETIME_SECS};
