//! Benchmarks for the offline cache hot paths.

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use pocket_tools::cache::{AssetRequest, AssetResponse, Manifest, MemoryStorage, OfflineCacheManager};
use pocket_tools::fetch::{FetchError, Fetcher};
use pocket_tools::tools::text_stats;

struct StaticFetcher;

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, FetchError> {
        Ok(AssetResponse::ok("text/plain", request.url.clone()))
    }
}

fn installed_manager(rt: &Runtime, generations: usize) -> OfflineCacheManager {
    let storage = Arc::new(MemoryStorage::new());
    rt.block_on(async {
        for i in 0..generations {
            let stale = OfflineCacheManager::new(
                storage.clone(),
                Arc::new(StaticFetcher),
                format!("stale-{i}"),
                Manifest::new([format!("/stale-{i}.js")]),
            );
            stale.install().await.unwrap();
        }
        let manager = OfflineCacheManager::new(
            storage.clone(),
            Arc::new(StaticFetcher),
            "current",
            Manifest::default(),
        );
        manager.install().await.unwrap();
        manager
    })
}

fn bench_handle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let manager = installed_manager(&rt, 0);
    rt.block_on(manager.activate()).unwrap();
    let hit = AssetRequest::get("/tools/unit-converter.js");
    let miss = AssetRequest::get("/not-in-manifest.js");

    c.bench_function("handle_cache_hit", |b| {
        b.iter(|| black_box(rt.block_on(manager.handle(black_box(&hit))).unwrap()))
    });

    c.bench_function("handle_cache_miss", |b| {
        b.iter(|| black_box(rt.block_on(manager.handle(black_box(&miss))).unwrap()))
    });
}

fn bench_lookup_across_generations(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let manager = installed_manager(&rt, 32);
    // Not yet active: every stale generation is scanned and none match.
    let req = AssetRequest::get("/index.html");

    c.bench_function("lookup_miss_32_stale_generations", |b| {
        b.iter(|| black_box(rt.block_on(manager.lookup(black_box(&req)))))
    });
}

fn bench_install(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("install_default_manifest", |b| {
        b.iter(|| {
            let manager = OfflineCacheManager::new(
                Arc::new(MemoryStorage::new()),
                Arc::new(StaticFetcher),
                "bench",
                Manifest::default(),
            );
            black_box(rt.block_on(manager.install()).unwrap())
        })
    });
}

fn bench_text_stats(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(2_000);

    c.bench_function("text_stats_90k_chars", |b| {
        b.iter(|| black_box(text_stats::analyze(black_box(&text))))
    });
}

criterion_group!(
    benches,
    bench_handle,
    bench_lookup_across_generations,
    bench_install,
    bench_text_stats,
);
criterion_main!(benches);
