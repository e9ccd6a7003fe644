//! Host allow-list

/// Whether `url` may be requested under the configured allow-list
///
/// An empty list disables the policy. Otherwise the URL must start with one
/// of the configured entries, compared as plain case-sensitive string
/// prefixes. The match is not URL-structure aware: `http://example.com`
/// also admits `http://example.com.evil.com`, so entries should end with a
/// `/` when that matters.
pub fn is_url_allowed(url: &str, allowed_hosts: &[String]) -> bool {
    if allowed_hosts.is_empty() {
        return true;
    }
    allowed_hosts.iter().any(|host| url.starts_with(host.as_str()))
}
