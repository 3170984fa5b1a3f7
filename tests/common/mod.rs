//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use pocket_tools::cache::{
    AssetCache, AssetRequest, AssetResponse, CacheStorage, MemoryStorage, StorageError,
};
use pocket_tools::fetch::{FetchError, Fetcher};

/// Serves a fixed set of paths. Unknown paths get a 404, and the whole
/// fetcher can be switched offline.
pub struct MapFetcher {
    assets: HashMap<String, AssetResponse>,
    failing: Vec<String>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MapFetcher {
    pub fn new(paths: &[&str]) -> Arc<Self> {
        Self::with_failures(paths, &[])
    }

    /// Like `new`, but requests for `failing` return a network error.
    pub fn with_failures(paths: &[&str], failing: &[&str]) -> Arc<Self> {
        let assets = paths
            .iter()
            .map(|p| (p.to_string(), AssetResponse::ok("text/plain", format!("content of {p}"))))
            .collect();
        Arc::new(Self {
            assets,
            failing: failing.iter().map(|s| s.to_string()).collect(),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) || self.failing.contains(&request.url) {
            return Err(FetchError::Network(format!("unreachable: {}", request.url)));
        }
        Ok(self
            .assets
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| AssetResponse::new(404, vec![], "Not Found")))
    }
}

/// In-memory registry with injected failures: `delete` for chosen
/// generations, `put` for chosen URLs, or `keys` altogether.
#[derive(Default)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    undeletable: Vec<String>,
    failing_puts: Arc<Vec<String>>,
    unlistable: bool,
}

impl FaultyStorage {
    pub fn undeletable(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            undeletable: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn failing_puts(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing_puts: Arc::new(urls.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        })
    }

    pub fn unlistable() -> Arc<Self> {
        Arc::new(Self {
            unlistable: true,
            ..Default::default()
        })
    }
}

#[async_trait]
impl CacheStorage for FaultyStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn AssetCache>, StorageError> {
        let inner = self.inner.open(name).await?;
        Ok(Arc::new(FaultyCache {
            inner,
            failing_puts: self.failing_puts.clone(),
        }))
    }

    async fn get(&self, name: &str) -> Result<Option<Arc<dyn AssetCache>>, StorageError> {
        self.inner.get(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        if self.undeletable.iter().any(|n| n == name) {
            return Err(StorageError::Unavailable(format!("{name} is locked")));
        }
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        if self.unlistable {
            return Err(StorageError::Unavailable("registry offline".to_string()));
        }
        self.inner.keys().await
    }
}

struct FaultyCache {
    inner: Arc<dyn AssetCache>,
    failing_puts: Arc<Vec<String>>,
}

#[async_trait]
impl AssetCache for FaultyCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn put(&self, request: &AssetRequest, response: AssetResponse) -> Result<(), StorageError> {
        if self.failing_puts.contains(&request.url) {
            return Err(StorageError::Unavailable(format!("disk full writing {}", request.url)));
        }
        self.inner.put(request, response).await
    }

    async fn match_request(
        &self,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>, StorageError> {
        self.inner.match_request(request).await
    }

    async fn identities(&self) -> Result<Vec<String>, StorageError> {
        self.inner.identities().await
    }

    async fn seal(&self) -> Result<(), StorageError> {
        self.inner.seal().await
    }
}

/// Put one entry into a generation, creating it.
pub async fn seed(storage: &dyn CacheStorage, generation: &str, path: &str, body: &str) {
    let cache = storage.open(generation).await.unwrap();
    cache
        .put(&AssetRequest::get(path), AssetResponse::ok("text/plain", body.to_string()))
        .await
        .unwrap();
}

/// Every identity in every generation, for registry comparisons.
pub async fn snapshot(storage: &dyn CacheStorage) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    for name in storage.keys().await.unwrap() {
        let cache = storage.get(&name).await.unwrap().unwrap();
        out.push((name, cache.identities().await.unwrap()));
    }
    out
}
