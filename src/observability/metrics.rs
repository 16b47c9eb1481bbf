use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Credential cache
    pub token_cache_hits: IntCounter,
    pub token_cache_misses: IntCounter,
    pub provider_fetches: IntCounter,
    pub provider_fetch_failures: IntCounter,
    pub lock_contention: IntCounter,

    // Store
    pub store_fallbacks: IntCounterVec,

    // Config sync
    pub sync_cycles: IntCounterVec,
    pub config_installs: IntCounter,
    pub config_validation_errors: IntCounter,

    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("sidecar".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Token cache hits").unwrap(),
            token_cache_misses: IntCounter::new("token_cache_misses_total", "Token cache misses").unwrap(),
            provider_fetches: IntCounter::new("provider_fetches_total", "Identity provider token fetches").unwrap(),
            provider_fetch_failures: IntCounter::new("provider_fetch_failures_total", "Identity provider fetch failures").unwrap(),
            lock_contention: IntCounter::new("token_lock_contention_total", "Single-flight lock contention events").unwrap(),

            store_fallbacks: IntCounterVec::new(Opts::new("store_fallbacks_total", "Store calls answered by the local fallback"), &["op"]).unwrap(),

            sync_cycles: IntCounterVec::new(Opts::new("config_sync_cycles_total", "Config sync cycles by outcome"), &["outcome"]).unwrap(),
            config_installs: IntCounter::new("config_installs_total", "Configuration documents installed").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Candidate configs rejected by validation").unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.provider_fetches.clone())).unwrap();
        reg.register(Box::new(metrics.provider_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.lock_contention.clone())).unwrap();
        reg.register(Box::new(metrics.store_fallbacks.clone())).unwrap();
        reg.register(Box::new(metrics.sync_cycles.clone())).unwrap();
        reg.register(Box::new(metrics.config_installs.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics.up.set(1);
        metrics
    }
}
