use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub upstream_requests_total: IntCounterVec,
    pub upstream_latency_seconds: HistogramVec,
    pub query_cache_entries: IntGauge,
    pub cache_invalidations_total: IntCounterVec,
    pub location_reports_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let upstream_requests_total = IntCounterVec::new(
            Opts::new(
                "upstream_requests_total",
                "Backend API requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid upstream_requests_total metric");

        let upstream_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "upstream_latency_seconds",
                "Backend API round trip latency in seconds",
            ),
            &["endpoint"],
        )
        .expect("valid upstream_latency_seconds metric");

        let query_cache_entries =
            IntGauge::new("query_cache_entries", "Current number of cached query results")
                .expect("valid query_cache_entries metric");

        let cache_invalidations_total = IntCounterVec::new(
            Opts::new(
                "cache_invalidations_total",
                "Cached query results dropped, by tag",
            ),
            &["tag"],
        )
        .expect("valid cache_invalidations_total metric");

        let location_reports_total = IntCounterVec::new(
            Opts::new(
                "location_reports_total",
                "Driver location reports forwarded to the backend, by outcome",
            ),
            &["outcome"],
        )
        .expect("valid location_reports_total metric");

        registry
            .register(Box::new(upstream_requests_total.clone()))
            .expect("register upstream_requests_total");
        registry
            .register(Box::new(upstream_latency_seconds.clone()))
            .expect("register upstream_latency_seconds");
        registry
            .register(Box::new(query_cache_entries.clone()))
            .expect("register query_cache_entries");
        registry
            .register(Box::new(cache_invalidations_total.clone()))
            .expect("register cache_invalidations_total");
        registry
            .register(Box::new(location_reports_total.clone()))
            .expect("register location_reports_total");

        Self {
            registry,
            upstream_requests_total,
            upstream_latency_seconds,
            query_cache_entries,
            cache_invalidations_total,
            location_reports_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
