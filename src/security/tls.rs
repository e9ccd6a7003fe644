//! TLS configuration derived from datasource settings

use crate::error::{Error, Result};
use crate::settings::Settings;
use reqwest::{Certificate, ClientBuilder, Identity};
use tracing::warn;

/// Transport-level TLS configuration
#[derive(Clone, Default)]
pub struct TlsConfig {
    /// Accept any server certificate
    pub insecure_skip_verify: bool,
    /// Expected server name, when overridden
    ///
    /// Advisory only: reqwest always verifies against the URL host, so a
    /// set value is logged and otherwise ignored.
    pub server_name: Option<String>,
    /// Client certificate and key presented to the server
    pub identity: Option<Identity>,
    /// Trust roots replacing the built-in set (empty = built-in roots)
    pub root_certificates: Vec<Certificate>,
}

impl TlsConfig {
    /// Whether a client certificate is presented
    pub fn has_client_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether the built-in trust roots are replaced by a pinned CA
    pub fn pins_ca(&self) -> bool {
        !self.root_certificates.is_empty()
    }

    /// Apply this configuration to a client builder
    pub fn apply(self, mut builder: ClientBuilder) -> ClientBuilder {
        if self.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(name) = &self.server_name {
            // reqwest verifies against the URL host; no override hook is exposed
            warn!(
                server_name = %name,
                "TLS server name override is not supported, verifying against the URL host"
            );
        }

        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }

        if !self.root_certificates.is_empty() {
            builder = builder.tls_built_in_root_certs(false);
            for cert in self.root_certificates {
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("server_name", &self.server_name)
            .field("has_client_identity", &self.identity.is_some())
            .field("root_certificates", &self.root_certificates.len())
            .finish()
    }
}

/// Build the TLS configuration from settings
///
/// Requested-but-misconfigured material is always an
/// [`Error::InvalidCredential`], never silently dropped.
pub fn build_tls_config(settings: &Settings) -> Result<TlsConfig> {
    let mut config = TlsConfig {
        insecure_skip_verify: settings.insecure_skip_verify,
        server_name: Some(settings.server_name.clone()).filter(|s| !s.is_empty()),
        ..Default::default()
    };

    if settings.tls_client_auth {
        if settings.tls_client_cert.is_empty() || settings.tls_client_key.is_empty() {
            return Err(Error::invalid_credential("invalid Client cert or key"));
        }
        let pem = format!(
            "{}\n{}",
            settings.tls_client_cert.trim(),
            settings.tls_client_key.trim()
        );
        let identity = Identity::from_pem(pem.as_bytes()).map_err(|e| {
            Error::invalid_credential(format!("invalid Client cert or key: {e}"))
        })?;
        config.identity = Some(identity);
    }

    if settings.tls_auth_with_ca_cert && !settings.tls_ca_cert.is_empty() {
        let certs = Certificate::from_pem_bundle(settings.tls_ca_cert.as_bytes())
            .map_err(|e| Error::invalid_credential(format!("invalid TLS CA certificate: {e}")))?;
        if certs.is_empty() {
            return Err(Error::invalid_credential("invalid TLS CA certificate"));
        }
        config.root_certificates = certs;
    }

    Ok(config)
}
