//! # Request ID Tracking
//!
//! Identifiers used to correlate the log lines of one request.
//! Uses CUID2 for collision-resistant, URL-safe identifiers.

use std::fmt;

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request ID type using CUID2.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request ID.
    #[inline]
    pub fn new() -> Self { Self(cuid2::create_id()) }

    /// Get the request ID as a string.
    #[inline]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Consume and return the inner string.
    #[inline]
    pub fn into_string(self) -> String { self.0 }

    /// Accept an inbound header value when it looks like an ID we would
    /// generate ourselves; anything else is replaced.
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let valid = (20 ..= 64).contains(&value.len()) &&
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(value.to_string()))
    }

    /// Reuse the inbound ID if acceptable, otherwise generate one.
    pub fn from_header_or_new(value: Option<&str>) -> Self { value.and_then(Self::from_header).unwrap_or_default() }
}

impl Default for RequestId {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_uniqueness() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_from_header_accepts_cuid() {
        let id = RequestId::new();
        assert_eq!(RequestId::from_header(id.as_str()), Some(id));
    }

    #[test]
    fn test_from_header_rejects_garbage() {
        assert!(RequestId::from_header("short").is_none());
        assert!(RequestId::from_header("invalid!@#invalid!@#invalid").is_none());
    }

    #[test]
    fn test_from_header_or_new() {
        let fresh = RequestId::from_header_or_new(Some("bad"));
        assert_ne!(fresh.as_str(), "bad");
        assert!(!fresh.as_str().is_empty());
    }
}
