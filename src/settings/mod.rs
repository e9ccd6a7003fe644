//! Datasource settings
//!
//! Settings are loaded once per datasource instance (from YAML or JSON)
//! and shared read-only by every query the instance executes.

mod types;

pub use types::{
    ApiKeyLocation, AuthenticationMethod, OAuth2Settings, OAuth2Type, Settings, DEFAULT_TIMEOUT,
};
