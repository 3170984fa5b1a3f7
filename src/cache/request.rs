//! Request identity and response types flowing through the asset cache.
//!
//! A request is identified by its method and the URL exactly as issued
//! (path and query, no normalisation). Responses carry status, headers and
//! an immutable body so they can be stored and replayed byte-for-byte.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A request as seen at the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRequest {
    /// Upper-case HTTP method (e.g. "GET").
    pub method: String,

    /// Path and query exactly as issued (e.g. "/tools/unit-converter.js?v=2").
    pub url: String,
}

impl AssetRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Shorthand for a GET request, the only kind the manifest contains.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Identity key used by storage backends: `"{METHOD} {url}"`.
    pub fn identity(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Display for AssetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A stored or freshly fetched response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers in the order they were received.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: Bytes,
}

impl AssetResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// A 200 response with a content type and body.
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(
            200,
            vec![("content-type".to_string(), content_type.to_string())],
            body,
        )
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_uses_method_and_exact_url() {
        let req = AssetRequest::new("get", "/index.html?x=1");
        assert_eq!(req.method, "GET");
        assert_eq!(req.identity(), "GET /index.html?x=1");
        assert_ne!(req, AssetRequest::get("/index.html"));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = AssetResponse::ok("text/css", "body{}");
        assert_eq!(resp.header("Content-Type"), Some("text/css"));
        assert!(resp.is_success());
        assert!(!AssetResponse::new(404, vec![], "").is_success());
    }
}
