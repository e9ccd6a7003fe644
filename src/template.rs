//! Secure query field substitution
//!
//! Handles `${__qs.<name>}` placeholders in URLs, bodies and header values.
//! Each placeholder is resolved against the datasource's secure query fields,
//! either with the real secret (for execution) or with a fixed redaction
//! string (for anything shown back to a user).

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// String substituted for secrets when rendering for display
pub const REDACTED: &str = "xxxxxxxx";

/// Regex for matching secure field placeholders: ${__qs.name}
static SECURE_FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{__qs\.([^}]+)\}").unwrap());

/// Whether placeholders resolve to real secrets or to [`REDACTED`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretMode {
    /// Substitute the real value
    Include,
    /// Substitute the redaction string
    Redact,
}

impl SecretMode {
    /// Mode for a boolean `include_secrets` flag
    pub fn from_include(include_secrets: bool) -> Self {
        if include_secrets {
            SecretMode::Include
        } else {
            SecretMode::Redact
        }
    }

    /// Render a secret value in this mode
    pub fn reveal<'a>(&self, secret: &'a str) -> &'a str {
        match self {
            SecretMode::Include => secret,
            SecretMode::Redact => REDACTED,
        }
    }
}

/// Replace every known `${__qs.<name>}` placeholder in `input`
///
/// Unknown names are left as literal text.
pub fn render_secure_fields(
    input: &str,
    fields: &HashMap<String, String>,
    mode: SecretMode,
) -> String {
    if fields.is_empty() || !has_secure_fields(input) {
        return input.to_string();
    }

    SECURE_FIELD_REGEX
        .replace_all(input, |caps: &Captures| match fields.get(&caps[1]) {
            Some(value) => mode.reveal(value).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Check if a string contains secure field placeholders
pub fn has_secure_fields(s: &str) -> bool {
    SECURE_FIELD_REGEX.is_match(s)
}
