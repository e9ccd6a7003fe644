//! Security policy
//!
//! Pure decisions about where requests may go and how the transport
//! authenticates the server (and itself) over TLS.
//!
//! - [`is_url_allowed`] enforces the host allow-list on every outbound request
//! - [`build_tls_config`] turns TLS settings into a [`TlsConfig`] for the client

mod allow_list;
mod tls;

pub use allow_list::is_url_allowed;
pub use tls::{build_tls_config, TlsConfig};
