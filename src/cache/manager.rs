//! Offline asset cache manager: install / activate / handle lifecycle.
//!
//! The manager owns one versioned generation of the fixed manifest and keeps
//! the registry down to that generation:
//! - `install` populates the generation all-or-nothing
//! - `activate` evicts every other generation, best-effort per generation
//! - `handle` serves from the registry, falling back to the network
//!
//! The host sequences the phases; the manager only guards against calling
//! them out of order.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::manifest::Manifest;
use crate::cache::request::{AssetRequest, AssetResponse};
use crate::cache::storage::{AssetCache, CacheStorage, StorageError};
use crate::fetch::{FetchError, Fetcher};
use crate::metrics::CacheMetrics;

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    /// Populated and waiting for activation.
    Installed,
    Activating,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninstalled => write!(f, "uninstalled"),
            LifecycleState::Installing => write!(f, "installing"),
            LifecycleState::Installed => write!(f, "installed"),
            LifecycleState::Activating => write!(f, "activating"),
            LifecycleState::Active => write!(f, "active"),
        }
    }
}

/// A manifest asset that could not be fetched during install.
#[derive(Debug, Clone, Serialize)]
pub struct AssetFailure {
    pub request: AssetRequest,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(
        "{} of {total} manifest assets failed to fetch (first: {})",
        .failures.len(),
        first_failure(.failures)
    )]
    Population {
        total: usize,
        failures: Vec<AssetFailure>,
    },

    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: LifecycleState,
    },
}

fn first_failure(failures: &[AssetFailure]) -> String {
    failures
        .first()
        .map(|f| format!("{}: {}", f.request, f.reason))
        .unwrap_or_default()
}

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    /// Entries in the generation.
    pub assets: usize,
    /// True if the generation already existed and was not re-populated.
    pub reused: bool,
}

/// A stale generation that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct EvictionFailure {
    pub generation: String,
    pub reason: String,
}

/// Outcome of activation. Activation completes even when cleanup fails.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub version: String,
    pub evicted: Vec<String>,
    pub failed: Vec<EvictionFailure>,
    /// Set when the registry could not be listed at all.
    pub listing_error: Option<String>,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.listing_error.is_none()
    }
}

/// Where a handled response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedFrom {
    Cache { generation: String },
    Network,
}

/// A handled request.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: AssetResponse,
    pub source: ServedFrom,
}

impl Served {
    pub fn is_cache_hit(&self) -> bool {
        matches!(self.source, ServedFrom::Cache { .. })
    }
}

/// Diagnostics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub version: String,
    pub state: LifecycleState,
    pub manifest_len: usize,
    pub generations: Vec<String>,
}

/// The offline asset cache manager.
pub struct OfflineCacheManager {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    version: String,
    manifest: Manifest,
    state: RwLock<LifecycleState>,
    metrics: Option<Arc<CacheMetrics>>,
}

impl OfflineCacheManager {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        version: impl Into<String>,
        manifest: Manifest,
    ) -> Self {
        Self {
            storage,
            fetcher,
            version: version.into(),
            manifest,
            state: RwLock::new(LifecycleState::Uninstalled),
            metrics: None,
        }
    }

    /// Record lifecycle and request counters on `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<CacheMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    async fn transition(
        &self,
        action: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), LifecycleError> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(LifecycleError::InvalidState {
                action,
                state: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Populate the current generation from the manifest.
    ///
    /// All-or-nothing: on failure no generation named `version` is left in
    /// the registry and the manager returns to `Uninstalled`.
    pub async fn install(&self) -> Result<InstallReport, LifecycleError> {
        self.transition("install", LifecycleState::Uninstalled, LifecycleState::Installing)
            .await?;

        let result = self.populate().await;

        let mut state = self.state.write().await;
        match result {
            Ok(report) => {
                *state = LifecycleState::Installed;
                if let Some(m) = &self.metrics {
                    m.installs.with_label_values(&["ok"]).inc();
                }
                info!(
                    version = %report.version,
                    assets = report.assets,
                    reused = report.reused,
                    "Install complete"
                );
                Ok(report)
            }
            Err(e) => {
                *state = LifecycleState::Uninstalled;
                if let Some(m) = &self.metrics {
                    m.installs.with_label_values(&["failed"]).inc();
                }
                error!(version = %self.version, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<InstallReport, LifecycleError> {
        if let Some(existing) = self.storage.get(&self.version).await? {
            // The name is the invalidation signal; an existing generation is kept as is.
            let assets = existing.len().await?;
            info!(version = %self.version, assets, "Generation already present, skipping population");
            return Ok(InstallReport {
                version: self.version.clone(),
                assets,
                reused: true,
            });
        }

        info!(version = %self.version, assets = self.manifest.len(), "Caching assets");

        let requests: Vec<AssetRequest> = self
            .manifest
            .paths()
            .iter()
            .map(|path| AssetRequest::get(path.as_str()))
            .collect();
        let results = join_all(requests.iter().map(|req| self.fetcher.fetch(req))).await;

        let mut fetched = Vec::with_capacity(requests.len());
        let mut failures = Vec::new();
        for (request, result) in requests.into_iter().zip(results) {
            match result {
                Ok(response) if response.is_success() => fetched.push((request, response)),
                Ok(response) => {
                    warn!(request = %request, status = response.status, "Manifest asset returned non-success status");
                    failures.push(AssetFailure {
                        request,
                        reason: format!("status {}", response.status),
                    });
                }
                Err(e) => {
                    warn!(request = %request, error = %e, "Manifest asset fetch failed");
                    failures.push(AssetFailure {
                        request,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(LifecycleError::Population {
                total: self.manifest.len(),
                failures,
            });
        }

        // Nothing touches storage until every asset is in hand.
        let assets = fetched.len();
        if let Err(e) = self.store_all(fetched).await {
            match self.storage.delete(&self.version).await {
                Ok(_) => debug!(version = %self.version, "Removed partially stored generation"),
                Err(cleanup) => error!(
                    version = %self.version,
                    error = %cleanup,
                    "Failed to remove partially stored generation"
                ),
            }
            return Err(e.into());
        }

        Ok(InstallReport {
            version: self.version.clone(),
            assets,
            reused: false,
        })
    }

    async fn store_all(&self, fetched: Vec<(AssetRequest, AssetResponse)>) -> Result<(), StorageError> {
        let cache = self.storage.open(&self.version).await?;
        let puts = fetched.into_iter().map(|(request, response)| {
            let cache = cache.clone();
            async move { cache.put(&request, response).await }
        });
        join_all(puts)
            .await
            .into_iter()
            .collect::<Result<(), StorageError>>()?;
        cache.seal().await
    }

    /// Evict every generation other than the current one and start serving it.
    pub async fn activate(&self) -> Result<ActivationReport, LifecycleError> {
        self.transition("activate", LifecycleState::Installed, LifecycleState::Activating)
            .await?;

        let mut report = ActivationReport {
            version: self.version.clone(),
            evicted: Vec::new(),
            failed: Vec::new(),
            listing_error: None,
        };

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not list cache generations, skipping eviction");
                report.listing_error = Some(e.to_string());
                Vec::new()
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|n| *n != self.version).collect();
        if !stale.is_empty() {
            info!(count = stale.len(), "Clearing old caches");
        }

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
        for (generation, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    if let Some(m) = &self.metrics {
                        m.evicted_generations.inc();
                    }
                    debug!(generation = %generation, "Evicted stale generation");
                    report.evicted.push(generation);
                }
                Err(e) => {
                    warn!(generation = %generation, error = %e, "Failed to evict stale generation");
                    report.failed.push(EvictionFailure {
                        generation,
                        reason: e.to_string(),
                    });
                }
            }
        }

        *self.state.write().await = LifecycleState::Active;
        info!(
            version = %self.version,
            evicted = report.evicted.len(),
            failed = report.failed.len(),
            "Activation complete"
        );
        Ok(report)
    }

    /// Install, then activate if install succeeded.
    pub async fn install_and_activate(
        &self,
    ) -> Result<(InstallReport, ActivationReport), LifecycleError> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Look a request up in the registry without touching the network.
    ///
    /// The current generation is consulted first, and only once active; other
    /// generations keep serving until activation removes them.
    pub async fn lookup(&self, request: &AssetRequest) -> Option<(String, AssetResponse)> {
        // The current generation is opened by name so it serves even when the
        // registry cannot be listed.
        if self.state().await == LifecycleState::Active {
            if let Some(hit) = self.match_in(&self.version, request).await {
                return Some(hit);
            }
        }

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not list cache generations, skipping older generations");
                return None;
            }
        };

        for name in names.iter().filter(|n| **n != self.version) {
            if let Some(hit) = self.match_in(name, request).await {
                return Some(hit);
            }
        }
        None
    }

    async fn match_in(&self, name: &str, request: &AssetRequest) -> Option<(String, AssetResponse)> {
        let cache: Arc<dyn AssetCache> = match self.storage.get(name).await {
            Ok(Some(cache)) => cache,
            Ok(None) => return None,
            Err(e) => {
                warn!(generation = %name, error = %e, "Could not open generation");
                return None;
            }
        };
        match cache.match_request(request).await {
            Ok(Some(response)) => Some((name.to_string(), response)),
            Ok(None) => None,
            Err(e) => {
                warn!(generation = %name, request = %request, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    /// Serve a request from the registry, or forward it to the network.
    ///
    /// Network responses are returned as is and never written back. Network
    /// failures are returned unchanged.
    pub async fn handle(&self, request: &AssetRequest) -> Result<Served, FetchError> {
        if let Some((generation, response)) = self.lookup(request).await {
            if let Some(m) = &self.metrics {
                m.cache_hits.inc();
            }
            debug!(request = %request, generation = %generation, "Cache hit");
            return Ok(Served {
                response,
                source: ServedFrom::Cache { generation },
            });
        }

        if let Some(m) = &self.metrics {
            m.cache_misses.inc();
        }
        debug!(request = %request, "Cache miss, forwarding to network");

        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(Served {
                response,
                source: ServedFrom::Network,
            }),
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.network_errors.inc();
                }
                warn!(request = %request, error = %e, "Network request failed on cache miss");
                Err(e)
            }
        }
    }

    /// Current state and registry contents.
    pub async fn status(&self) -> Result<StatusReport, StorageError> {
        Ok(StatusReport {
            version: self.version.clone(),
            state: self.state().await,
            manifest_len: self.manifest.len(),
            generations: self.storage.keys().await?,
        })
    }
}
