//! Prometheus counters for the offline cache.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Cache lifecycle and request counters, registered on a private registry.
pub struct CacheMetrics {
    registry: Registry,
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,
    pub network_errors: IntCounter,
    pub installs: IntCounterVec,
    pub evicted_generations: IntCounter,
}

impl CacheMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("pocket_tools".to_string()), None)?;

        let cache_hits = IntCounter::new("cache_hits_total", "Requests served from the cache")?;
        let cache_misses = IntCounter::new(
            "cache_misses_total",
            "Requests forwarded to the network on a cache miss",
        )?;
        let network_errors = IntCounter::new(
            "network_errors_total",
            "Forwarded requests that failed at the network",
        )?;
        let installs = IntCounterVec::new(
            Opts::new("installs_total", "Install phases by outcome"),
            &["outcome"],
        )?;
        let evicted_generations = IntCounter::new(
            "evicted_generations_total",
            "Stale generations deleted during activation",
        )?;

        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;
        registry.register(Box::new(network_errors.clone()))?;
        registry.register(Box::new(installs.clone()))?;
        registry.register(Box::new(evicted_generations.clone()))?;

        Ok(Self {
            registry,
            cache_hits,
            cache_misses,
            network_errors,
            installs,
            evicted_generations,
        })
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
