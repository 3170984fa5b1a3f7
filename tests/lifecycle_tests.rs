//! Integration tests for the install / activate / handle lifecycle.

mod common;

use std::sync::Arc;

use pocket_tools::cache::manager::ActivationReport;
use pocket_tools::cache::{
    AssetRequest, CacheStorage, LifecycleError, LifecycleState, Manifest, MemoryStorage,
    OfflineCacheManager, ServedFrom,
};
use pocket_tools::fetch::FetchError;

use common::{seed, snapshot, FaultyStorage, MapFetcher};

const SITE: &[&str] = &["/", "/index.html", "/styles.css", "/script.js"];

fn manager(
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<MapFetcher>,
    version: &str,
) -> OfflineCacheManager {
    OfflineCacheManager::new(storage, fetcher, version, Manifest::new(SITE.iter().copied()))
}

#[tokio::test]
async fn test_install_populates_every_manifest_path() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage.clone(), fetcher.clone(), "v1");

    let report = mgr.install().await.unwrap();
    assert_eq!(report.assets, SITE.len());
    assert!(!report.reused);
    assert_eq!(fetcher.calls(), SITE.len());

    let cache = storage.get("v1").await.unwrap().unwrap();
    for path in SITE {
        let hit = cache.match_request(&AssetRequest::get(*path)).await.unwrap();
        assert_eq!(hit.unwrap().body, format!("content of {path}"));
    }
}

#[tokio::test]
async fn test_one_failed_asset_leaves_no_generation() {
    let storage = Arc::new(MemoryStorage::new());
    seed(storage.as_ref(), "v1", "/index.html", "old").await;
    let before = snapshot(storage.as_ref()).await;

    let fetcher = MapFetcher::with_failures(SITE, &["/script.js"]);
    let mgr = manager(storage.clone(), fetcher, "v2");

    let err = mgr.install().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Population { total: 4, .. }));
    assert!(err.to_string().contains("/script.js"));
    assert_eq!(mgr.state().await, LifecycleState::Uninstalled);

    // The previous generation is untouched and the new one never appeared.
    assert!(!storage.has("v2").await.unwrap());
    assert_eq!(snapshot(storage.as_ref()).await, before);
}

#[tokio::test]
async fn test_non_success_status_fails_install() {
    let storage = Arc::new(MemoryStorage::new());
    // "/script.js" is not served, so the fetcher answers 404.
    let fetcher = MapFetcher::new(&["/", "/index.html", "/styles.css"]);
    let mgr = manager(storage.clone(), fetcher, "v1");

    let err = mgr.install().await.unwrap_err();
    match err {
        LifecycleError::Population { failures, .. } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].reason, "status 404");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_install_can_be_retried() {
    let storage = Arc::new(MemoryStorage::new());
    let failing = MapFetcher::with_failures(SITE, &["/"]);
    let mgr = manager(storage.clone(), failing, "v1");
    assert!(mgr.install().await.is_err());

    let healthy = manager(storage.clone(), MapFetcher::new(SITE), "v1");
    healthy.install_and_activate().await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
}

#[tokio::test]
async fn test_reinstall_same_version_does_not_fetch() {
    let storage = Arc::new(MemoryStorage::new());
    manager(storage.clone(), MapFetcher::new(SITE), "v1")
        .install_and_activate()
        .await
        .unwrap();

    let fetcher = MapFetcher::new(SITE);
    let again = manager(storage.clone(), fetcher.clone(), "v1");
    let report = again.install().await.unwrap();
    assert!(report.reused);
    assert_eq!(report.assets, SITE.len());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_version_bump_evicts_old_generation() {
    let storage = Arc::new(MemoryStorage::new());
    let v1 = manager(storage.clone(), MapFetcher::new(SITE), "v1");
    v1.install_and_activate().await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);

    let v2 = manager(storage.clone(), MapFetcher::new(SITE), "v2");
    v2.install().await.unwrap();

    // Before activation both generations exist and the old one keeps serving.
    assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string(), "v2".to_string()]);
    let served = v2.handle(&AssetRequest::get("/index.html")).await.unwrap();
    assert_eq!(
        served.source,
        ServedFrom::Cache {
            generation: "v1".to_string()
        }
    );

    let report = v2.activate().await.unwrap();
    assert_eq!(report.evicted, vec!["v1".to_string()]);
    assert!(report.is_clean());
    assert_eq!(storage.keys().await.unwrap(), vec!["v2".to_string()]);

    let served = v2.handle(&AssetRequest::get("/index.html")).await.unwrap();
    assert_eq!(
        served.source,
        ServedFrom::Cache {
            generation: "v2".to_string()
        }
    );
}

#[tokio::test]
async fn test_activation_completes_when_a_delete_fails() {
    let storage = FaultyStorage::undeletable(&["v0"]);
    seed(storage.as_ref(), "v0", "/index.html", "zero").await;
    seed(storage.as_ref(), "v1", "/index.html", "one").await;

    let mgr = manager(storage.clone(), MapFetcher::new(SITE), "v2");
    mgr.install().await.unwrap();
    let report: ActivationReport = mgr.activate().await.unwrap();

    assert_eq!(mgr.state().await, LifecycleState::Active);
    assert_eq!(report.evicted, vec!["v1".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].generation, "v0");
    assert!(!report.is_clean());
    assert_eq!(storage.keys().await.unwrap(), vec!["v0".to_string(), "v2".to_string()]);

    // The current generation is consulted before the leftover.
    let served = mgr.handle(&AssetRequest::get("/index.html")).await.unwrap();
    assert_eq!(served.response.body, "content of /index.html");
}

#[tokio::test]
async fn test_activation_completes_when_registry_cannot_be_listed() {
    let storage = FaultyStorage::unlistable();
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage.clone(), fetcher.clone(), "v2");
    mgr.install().await.unwrap();

    let report = mgr.activate().await.unwrap();
    assert_eq!(mgr.state().await, LifecycleState::Active);
    assert!(report.evicted.is_empty());
    assert!(report.listing_error.unwrap().contains("registry offline"));

    // The current generation still serves without a listing.
    fetcher.go_offline();
    let served = mgr.handle(&AssetRequest::get("/styles.css")).await.unwrap();
    assert_eq!(
        served.source,
        ServedFrom::Cache {
            generation: "v2".to_string()
        }
    );
}

#[tokio::test]
async fn test_store_failure_removes_partial_generation() {
    let storage = FaultyStorage::failing_puts(&["/styles.css"]);
    seed(storage.as_ref(), "v1", "/index.html", "previous").await;

    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage.clone(), fetcher.clone(), "v2");

    let err = mgr.install().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Storage(_)));
    assert!(err.to_string().contains("/styles.css"));
    assert_eq!(mgr.state().await, LifecycleState::Uninstalled);
    assert!(!storage.has("v2").await.unwrap());
    assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);

    // The previous generation keeps serving.
    fetcher.go_offline();
    let served = mgr.handle(&AssetRequest::get("/index.html")).await.unwrap();
    assert_eq!(served.response.body, "previous");
    assert_eq!(
        served.source,
        ServedFrom::Cache {
            generation: "v1".to_string()
        }
    );
}

#[tokio::test]
async fn test_handle_before_install_goes_to_network() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage.clone(), fetcher.clone(), "v1");

    let served = mgr.handle(&AssetRequest::get("/styles.css")).await.unwrap();
    assert_eq!(served.source, ServedFrom::Network);
    assert_eq!(fetcher.calls(), 1);
    assert!(storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_installed_generation_not_served_before_activation() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage, fetcher.clone(), "v1");
    mgr.install().await.unwrap();
    fetcher.go_offline();

    let err = mgr.handle(&AssetRequest::get("/index.html")).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_offline_serves_every_manifest_asset() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage, fetcher.clone(), "v1");
    mgr.install_and_activate().await.unwrap();
    fetcher.go_offline();
    let calls = fetcher.calls();

    for path in SITE {
        let served = mgr.handle(&AssetRequest::get(*path)).await.unwrap();
        assert!(served.is_cache_hit(), "{path} should be cached");
        assert_eq!(served.response.body, format!("content of {path}"));
    }
    assert_eq!(fetcher.calls(), calls);
}

#[tokio::test]
async fn test_miss_is_forwarded_and_not_stored() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(&["/", "/index.html", "/styles.css", "/script.js", "/extra.js"]);
    let mgr = manager(storage.clone(), fetcher.clone(), "v1");
    mgr.install_and_activate().await.unwrap();
    let before = snapshot(storage.as_ref()).await;

    let served = mgr.handle(&AssetRequest::get("/extra.js")).await.unwrap();
    assert_eq!(served.source, ServedFrom::Network);
    assert_eq!(served.response.body, "content of /extra.js");

    // A second request misses again: nothing was written back.
    let again = mgr.handle(&AssetRequest::get("/extra.js")).await.unwrap();
    assert_eq!(again.source, ServedFrom::Network);
    assert_eq!(snapshot(storage.as_ref()).await, before);
}

#[tokio::test]
async fn test_lookup_uses_exact_url_and_method() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = MapFetcher::new(SITE);
    let mgr = manager(storage, fetcher.clone(), "v1");
    mgr.install_and_activate().await.unwrap();
    fetcher.go_offline();

    assert!(mgr.lookup(&AssetRequest::get("/index.html")).await.is_some());
    assert!(mgr.lookup(&AssetRequest::get("/index.html?v=2")).await.is_none());
    assert!(mgr.lookup(&AssetRequest::new("POST", "/index.html")).await.is_none());

    // Misses while offline surface the network error unchanged.
    let err = mgr.handle(&AssetRequest::get("/index.html?v=2")).await.unwrap_err();
    assert_eq!(err.to_string(), "Network error: unreachable: /index.html?v=2");
}

#[tokio::test]
async fn test_phases_out_of_order_are_rejected() {
    let storage = Arc::new(MemoryStorage::new());
    let mgr = manager(storage, MapFetcher::new(SITE), "v1");

    assert!(matches!(
        mgr.activate().await.unwrap_err(),
        LifecycleError::InvalidState { action: "activate", state: LifecycleState::Uninstalled }
    ));

    mgr.install_and_activate().await.unwrap();
    assert!(matches!(
        mgr.install().await.unwrap_err(),
        LifecycleError::InvalidState { action: "install", state: LifecycleState::Active }
    ));
}

#[tokio::test]
async fn test_status_reports_registry() {
    let storage = Arc::new(MemoryStorage::new());
    let mgr = manager(storage, MapFetcher::new(SITE), "v1");
    mgr.install_and_activate().await.unwrap();

    let status = mgr.status().await.unwrap();
    assert_eq!(status.version, "v1");
    assert_eq!(status.state, LifecycleState::Active);
    assert_eq!(status.manifest_len, SITE.len());
    assert_eq!(status.generations, vec!["v1".to_string()]);
}
