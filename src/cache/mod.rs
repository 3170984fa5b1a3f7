//! Offline asset cache.
//!
//! This module contains the versioned asset cache and its storage backends:
//! - [`request`]: AssetRequest / AssetResponse and request identity
//! - [`manifest`]: the fixed asset manifest and default generation name
//! - [`storage`]: CacheStorage / AssetCache capabilities and the in-memory registry
//! - [`disk`]: filesystem-backed registry
//! - [`manager`]: install / activate / handle lifecycle

pub mod disk;
pub mod manager;
pub mod manifest;
pub mod request;
pub mod storage;

pub use manager::{LifecycleError, LifecycleState, OfflineCacheManager, Served, ServedFrom};
pub use manifest::Manifest;
pub use request::{AssetRequest, AssetResponse};
pub use storage::{AssetCache, CacheStorage, MemoryStorage, StorageError};
