// SPDX-License-Identifier: MIT
//! Site identity: a filesystem-safe key derived from a URL's host.

use url::Url;

use crate::error::AuditError;

/// Directory-safe identifier for an audited site.
///
/// Derived deterministically from the URL's host: every character outside
/// `[A-Za-z0-9]` becomes `_`, so the same host always maps to the same
/// identifier and the result never contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteId(String);

impl SiteId {
    /// Derive the identifier from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidUrl`] when the URL cannot be parsed or
    /// has no host component (e.g. `file:` or `data:` URLs).
    pub fn from_url(url: &str) -> Result<Self, AuditError> {
        let parsed = Url::parse(url).map_err(|e| AuditError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().ok_or_else(|| AuditError::InvalidUrl {
            url: url.to_string(),
            reason: "no host component".to_string(),
        })?;
        let sanitized: String = host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_host_same_id() {
        let a = SiteId::from_url("https://example.com/a/b?q=1").unwrap();
        let b = SiteId::from_url("http://example.com").unwrap();
        let c = SiteId::from_url("https://example.com:443/other#frag").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn output_is_filesystem_safe() {
        let id = SiteId::from_url("https://courses.grainger.illinois.edu/CS568/sp2024").unwrap();
        assert_eq!(id.as_str(), "courses_grainger_illinois_edu");
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn punycode_and_dashes_sanitized() {
        let id = SiteId::from_url("https://my-site.example.com").unwrap();
        assert_eq!(id.as_str(), "my_site_example_com");
    }

    #[test]
    fn unparseable_url_is_invalid() {
        assert!(matches!(
            SiteId::from_url("not a url"),
            Err(AuditError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn hostless_url_is_invalid() {
        assert!(matches!(
            SiteId::from_url("data:text/html,<p>hi</p>"),
            Err(AuditError::InvalidUrl { .. })
        ));
    }
}
