//! Connection URL resolution.
//!
//! Declared targets may be absolute, protocol-relative, root-relative, or
//! plain relative; all resolve against the host's page base URL so a
//! `push-connect="/stream"` on any page reaches the same endpoint. Scheme
//! mapping for socket transports happens later, inside the transport that
//! needs it.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Resolution
// ============================================================================

/// Resolves a declared connection target against the page base URL.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when the value does not parse as a
/// reference against the base.
pub fn resolve_push_url(base: &Url, value: &str) -> Result<Url> {
    let trimmed = value.trim();
    base.join(trimmed)
        .map_err(|source| Error::invalid_url(trimmed, source))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.test/app/page").unwrap()
    }

    #[test]
    fn test_absolute_passthrough() {
        let url = resolve_push_url(&base(), "http://other.test/stream").unwrap();
        assert_eq!(url.as_str(), "http://other.test/stream");
    }

    #[test]
    fn test_root_relative() {
        let url = resolve_push_url(&base(), "/stream").unwrap();
        assert_eq!(url.as_str(), "https://example.test/stream");
    }

    #[test]
    fn test_plain_relative() {
        let url = resolve_push_url(&base(), "feed").unwrap();
        assert_eq!(url.as_str(), "https://example.test/app/feed");
    }

    #[test]
    fn test_protocol_relative_adopts_page_scheme() {
        let url = resolve_push_url(&base(), "//push.example.test/stream").unwrap();
        assert_eq!(url.as_str(), "https://push.example.test/stream");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let url = resolve_push_url(&base(), "  /stream ").unwrap();
        assert_eq!(url.path(), "/stream");
    }
}
