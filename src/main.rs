//! pocket-tools: serves the All-in-one Pocket hub with an offline asset cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use pocket_tools::cache::disk::DiskStorage;
use pocket_tools::cache::{CacheStorage, MemoryStorage, OfflineCacheManager};
use pocket_tools::config::{Cli, Config, StorageKind};
use pocket_tools::fetch::{DirFetcher, Fetcher, HttpFetcher};
use pocket_tools::metrics::CacheMetrics;
use pocket_tools::server::{build_router, AppState};
use pocket_tools::tools::theme::PreferenceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pocket_tools=debug,tower_http=debug"
    } else {
        "pocket_tools=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("pocket-tools v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config)?;

    info!(
        version = %config.cache.version,
        assets = config.cache.manifest.len(),
        storage = ?config.cache.storage,
        "Configuration loaded"
    );

    let storage: Arc<dyn CacheStorage> = match config.cache.storage {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::Disk => Arc::new(DiskStorage::new(&config.cache.storage_path).await?),
    };

    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let fetcher: Arc<dyn Fetcher> = match &config.upstream.origin {
        Some(origin) => {
            info!(origin = %origin, "Forwarding to upstream origin");
            Arc::new(HttpFetcher::new(origin, timeout)?)
        }
        None => {
            info!(dir = %config.upstream.asset_dir.display(), "Serving assets from local directory");
            Arc::new(DirFetcher::new(&config.upstream.asset_dir))
        }
    };

    let metrics = Arc::new(CacheMetrics::new()?);
    let manager = Arc::new(
        OfflineCacheManager::new(
            storage,
            fetcher,
            config.cache.version.clone(),
            config.cache.manifest.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    // The host keeps serving from the network if the offline copy cannot be built.
    match manager.install_and_activate().await {
        Ok((_, activation)) if !activation.is_clean() => {
            warn!(failed = activation.failed.len(), "Activated with stale generations left behind");
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "Offline cache unavailable, serving from network only"),
    }

    let preferences = PreferenceStore::load(config.preferences_file()).await;

    let state = Arc::new(AppState {
        manager,
        metrics,
        preferences,
        start_time: Instant::now(),
    });

    let app = build_router(state);

    let listen_addr = cli.listen.unwrap_or(config.server.listen);
    info!(addr = %listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
