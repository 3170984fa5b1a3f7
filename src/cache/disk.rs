//! Durable cache registry on the local filesystem.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<sha256(generation name)>/generation.json      (written on seal)
//! <root>/<sha256(generation name)>/generation.pending   (while populating)
//! <root>/<sha256(generation name)>/<sha256(identity)>.json   (status, headers, request)
//! <root>/<sha256(generation name)>/<sha256(identity)>.body
//! ```
//!
//! Directory names are content-addressed so arbitrary generation names and
//! URLs never escape the root. A generation becomes visible only when its
//! pending metadata is renamed to `generation.json`, so a crash mid-population
//! leaves nothing that `get` or `keys` will return.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use crate::cache::request::{AssetRequest, AssetResponse};
use crate::cache::storage::{AssetCache, CacheStorage, StorageError};

const GENERATION_FILE: &str = "generation.json";
const PENDING_FILE: &str = "generation.pending";

fn digest_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[derive(Debug, Serialize, Deserialize)]
struct GenerationMeta {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    request: AssetRequest,
    status: u16,
    headers: Vec<(String, String)>,
}

/// One generation directory.
pub struct DiskCache {
    name: String,
    dir: PathBuf,
}

impl DiskCache {
    fn entry_paths(&self, request: &AssetRequest) -> (PathBuf, PathBuf) {
        let key = digest_hex(&request.identity());
        (
            self.dir.join(format!("{key}.json")),
            self.dir.join(format!("{key}.body")),
        )
    }
}

#[async_trait]
impl AssetCache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, request: &AssetRequest, response: AssetResponse) -> Result<(), StorageError> {
        let (meta_path, body_path) = self.entry_paths(request);

        // Body first: an entry is only visible once its metadata exists.
        fs::write(&body_path, &response.body).await?;
        let meta = EntryMeta {
            request: request.clone(),
            status: response.status,
            headers: response.headers,
        };
        fs::write(&meta_path, serde_json::to_vec(&meta)?).await?;

        debug!(
            generation = %self.name,
            request = %request,
            size = response.body.len(),
            "Stored entry on disk"
        );
        Ok(())
    }

    async fn match_request(
        &self,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>, StorageError> {
        let (meta_path, body_path) = self.entry_paths(request);

        let meta = match fs::read(&meta_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = serde_json::from_slice(&meta)?;
        if meta.request != *request {
            // Digest collision; treat as a miss rather than serve the wrong asset.
            return Ok(None);
        }
        let body = fs::read(&body_path).await?;

        Ok(Some(AssetResponse {
            status: meta.status,
            headers: meta.headers,
            body: Bytes::from(body),
        }))
    }

    async fn identities(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_entry_meta = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|f| f != GENERATION_FILE);
            if !is_entry_meta {
                continue;
            }
            let meta: EntryMeta = serde_json::from_slice(&fs::read(&path).await?)?;
            out.push(meta.request.identity());
        }
        out.sort();
        Ok(out)
    }

    async fn seal(&self) -> Result<(), StorageError> {
        match fs::rename(self.dir.join(PENDING_FILE), self.dir.join(GENERATION_FILE)).await {
            Ok(()) => {
                debug!(generation = %self.name, "Sealed generation");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Already sealed.
                if fs::try_exists(self.dir.join(GENERATION_FILE)).await? {
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Filesystem-backed registry.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a registry rooted at `root`, creating the directory if needed.
    ///
    /// Generations left unsealed by an interrupted install are removed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let storage = Self { root };
        storage.sweep_unsealed().await?;
        Ok(storage)
    }

    async fn sweep_unsealed(&self) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let dir = entry.path();
            let unsealed = fs::try_exists(dir.join(PENDING_FILE)).await.unwrap_or(false)
                && !fs::try_exists(dir.join(GENERATION_FILE)).await.unwrap_or(true);
            if !unsealed {
                continue;
            }
            match fs::remove_dir_all(&dir).await {
                Ok(()) => warn!(path = %dir.display(), "Removed unsealed generation"),
                Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove unsealed generation"),
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.root.join(digest_hex(name))
    }

    async fn read_generation_meta(dir: &Path) -> Result<Option<GenerationMeta>, StorageError> {
        match fs::read(dir.join(GENERATION_FILE)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn AssetCache>, StorageError> {
        let dir = self.generation_dir(name);

        if Self::read_generation_meta(&dir).await?.is_none() {
            // Anything here is left over from an interrupted population.
            match fs::remove_dir_all(&dir).await {
                Ok(()) => warn!(generation = name, "Discarded unsealed generation"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            fs::create_dir_all(&dir).await?;
            let meta = GenerationMeta {
                name: name.to_string(),
                created_at: Utc::now(),
            };
            fs::write(dir.join(PENDING_FILE), serde_json::to_vec(&meta)?).await?;
            debug!(generation = name, path = %dir.display(), "Created generation directory");
        }

        Ok(Arc::new(DiskCache {
            name: name.to_string(),
            dir,
        }))
    }

    async fn get(&self, name: &str) -> Result<Option<Arc<dyn AssetCache>>, StorageError> {
        let dir = self.generation_dir(name);
        Ok(Self::read_generation_meta(&dir).await?.map(|_| {
            Arc::new(DiskCache {
                name: name.to_string(),
                dir,
            }) as Arc<dyn AssetCache>
        }))
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let dir = self.generation_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(generation = name, path = %dir.display(), "Deleted generation directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut generations = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match entry.metadata().await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable registry entry");
                    continue;
                }
            }
            // One bad generation must not hide the others.
            match Self::read_generation_meta(&path).await {
                Ok(Some(meta)) => generations.push(meta),
                Ok(None) => debug!(path = %path.display(), "Skipping unsealed generation"),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping generation with unreadable metadata"),
            }
        }
        generations.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(generations.into_iter().map(|g| g.name).collect())
    }
}
