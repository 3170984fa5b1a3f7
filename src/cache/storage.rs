//! Storage capability for the cache registry.
//!
//! The registry is a set of named generations; each generation maps request
//! identities to stored responses. Backends implement [`CacheStorage`] and
//! [`AssetCache`] so the manager never touches ambient global state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::request::{AssetRequest, AssetResponse};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache metadata: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Cache storage unavailable: {0}")]
    Unavailable(String),
}

/// One named generation of stored responses.
#[async_trait]
pub trait AssetCache: Send + Sync {
    /// Generation name.
    fn name(&self) -> &str;

    /// Store a response under the request's identity, replacing any previous entry.
    async fn put(&self, request: &AssetRequest, response: AssetResponse) -> Result<(), StorageError>;

    /// Exact-identity lookup.
    async fn match_request(
        &self,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>, StorageError>;

    /// Identities of every stored entry, sorted.
    async fn identities(&self) -> Result<Vec<String>, StorageError>;

    /// Mark the generation complete. Durable backends expose a generation
    /// through `get` and `keys` only once it is sealed.
    async fn seal(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Number of stored entries.
    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.identities().await?.len())
    }
}

/// The registry of generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn AssetCache>, StorageError>;

    /// Open an existing generation without creating it.
    async fn get(&self, name: &str) -> Result<Option<Arc<dyn AssetCache>>, StorageError>;

    /// Whether a generation with this name exists.
    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.get(name).await?.is_some())
    }

    /// Delete a generation. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Names of all generations, oldest first.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-process generation backed by a map.
pub struct MemoryCache {
    name: String,
    entries: RwLock<HashMap<String, AssetResponse>>,
}

impl MemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AssetCache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, request: &AssetRequest, response: AssetResponse) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(request.identity(), response);
        Ok(())
    }

    async fn match_request(
        &self,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>, StorageError> {
        Ok(self.entries.read().await.get(&request.identity()).cloned())
    }

    async fn identities(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Process-local registry. Generations keep creation order.
#[derive(Default)]
pub struct MemoryStorage {
    generations: RwLock<Vec<Arc<MemoryCache>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn AssetCache>, StorageError> {
        let mut generations = self.generations.write().await;
        if let Some(existing) = generations.iter().find(|g| g.name == name) {
            return Ok(existing.clone() as Arc<dyn AssetCache>);
        }
        let cache = Arc::new(MemoryCache::new(name));
        generations.push(cache.clone());
        debug!(generation = name, "Created in-memory generation");
        Ok(cache as Arc<dyn AssetCache>)
    }

    async fn get(&self, name: &str) -> Result<Option<Arc<dyn AssetCache>>, StorageError> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.clone() as Arc<dyn AssetCache>))
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.name != name);
        Ok(generations.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .generations
            .read()
            .await
            .iter()
            .map(|g| g.name.clone())
            .collect())
    }
}
