//! Network boundary: where cache misses and install-time population go.
//!
//! - [`HttpFetcher`]: forwards to an upstream origin over HTTP
//! - [`DirFetcher`]: reads assets from a local directory

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::cache::request::{AssetRequest, AssetResponse};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error("Unsupported method: {0}")]
    InvalidMethod(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Anything that can turn a request into a response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError>;
}

/// Forwards requests to `origin` + request URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::InvalidMethod(request.method.clone()))?;
        let url = format!("{}{}", self.origin, request.url);

        let resp = self.client.request(method, &url).send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = resp.bytes().await?;

        debug!(url, status, size = body.len(), "Fetched from upstream");
        Ok(AssetResponse {
            status,
            headers,
            body,
        })
    }
}

/// Serves assets from a local directory.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request URL onto a file under the root.
    fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        if !path.starts_with('/') {
            return Err(FetchError::InvalidPath(url.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(FetchError::InvalidPath(url.to_string())),
            }
        }
        if path.ends_with('/') {
            resolved.push("index.html");
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError> {
        if request.method != "GET" && request.method != "HEAD" {
            return Ok(AssetResponse::new(405, vec![], Bytes::new()));
        }

        let path = self.resolve(&request.url)?;
        let body = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::IsADirectory => {
                debug!(path = %path.display(), "Asset not found");
                return Ok(AssetResponse::new(
                    404,
                    vec![("content-type".to_string(), "text/plain".to_string())],
                    "Not Found",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let body = if request.method == "HEAD" {
            Bytes::new()
        } else {
            Bytes::from(body)
        };
        Ok(AssetResponse::ok(content_type_for(&path), body))
    }
}

/// Content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") | Some("webmanifest") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
