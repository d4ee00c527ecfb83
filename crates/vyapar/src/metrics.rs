use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Prometheus metrics for the platform.
///
/// Uses a dedicated (non-global) `Registry` so multiple `PlatformMetrics`
/// instances can coexist in tests without conflicting.
pub struct PlatformMetrics {
    registry: Registry,

    requests_total: IntCounter,
    requests_failed_total: IntCounter,
    requests_rejected_total: IntCounter,
    requests_active: IntGauge,
    requests_by_kind: IntCounterVec,
    request_duration_seconds: Histogram,

    agent_calls_total: IntCounterVec,
    agent_errors_total: IntCounterVec,
    agent_fallbacks_total: IntCounterVec,
}

impl PlatformMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounter::new(
            "vyapar_requests_total",
            "Total automation requests processed",
        )?;
        let requests_failed_total = IntCounter::new(
            "vyapar_requests_failed_total",
            "Total requests that ended in an error envelope",
        )?;
        let requests_rejected_total = IntCounter::new(
            "vyapar_requests_rejected_total",
            "Total requests rejected by rate or concurrency limits",
        )?;
        let requests_active = IntGauge::new(
            "vyapar_requests_active",
            "Number of requests currently being processed",
        )?;
        let requests_by_kind = IntCounterVec::new(
            Opts::new("vyapar_requests_by_kind_total", "Requests by routed kind"),
            &["kind"],
        )?;
        let request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "vyapar_request_duration_seconds",
                "Request processing duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;

        let agent_calls_total = IntCounterVec::new(
            Opts::new("vyapar_agent_calls_total", "Agent calls by agent name"),
            &["agent"],
        )?;
        let agent_errors_total = IntCounterVec::new(
            Opts::new("vyapar_agent_errors_total", "Agent errors by agent name"),
            &["agent"],
        )?;
        let agent_fallbacks_total = IntCounterVec::new(
            Opts::new(
                "vyapar_agent_fallbacks_total",
                "Fallback replies served by agent name",
            ),
            &["agent"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(requests_failed_total.clone()))?;
        registry.register(Box::new(requests_rejected_total.clone()))?;
        registry.register(Box::new(requests_active.clone()))?;
        registry.register(Box::new(requests_by_kind.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(agent_calls_total.clone()))?;
        registry.register(Box::new(agent_errors_total.clone()))?;
        registry.register(Box::new(agent_fallbacks_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            requests_failed_total,
            requests_rejected_total,
            requests_active,
            requests_by_kind,
            request_duration_seconds,
            agent_calls_total,
            agent_errors_total,
            agent_fallbacks_total,
        })
    }

    pub fn request_started(&self) {
        self.requests_total.inc();
        self.requests_active.inc();
    }

    pub fn request_finished(&self, kind: &str, failed: bool, duration_secs: f64) {
        self.requests_active.dec();
        self.requests_by_kind.with_label_values(&[kind]).inc();
        self.request_duration_seconds.observe(duration_secs);
        if failed {
            self.requests_failed_total.inc();
        }
    }

    pub fn request_rejected(&self) {
        self.requests_rejected_total.inc();
    }

    pub fn agent_called(&self, agent: &str) {
        self.agent_calls_total.with_label_values(&[agent]).inc();
    }

    pub fn agent_errored(&self, agent: &str) {
        self.agent_errors_total.with_label_values(&[agent]).inc();
    }

    pub fn agent_fallback(&self, agent: &str) {
        self.agent_fallbacks_total.with_label_values(&[agent]).inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&self.registry.gather())
    }
}
