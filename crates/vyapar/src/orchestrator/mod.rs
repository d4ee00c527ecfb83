pub mod breaker;
pub mod fallback;
pub mod routing;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::agent::AgentRegistry;
use crate::business::BusinessProfile;
use crate::config::OrchestratorConfig;
use crate::error::Error;
use crate::metrics::PlatformMetrics;
use crate::request::{AgentReply, AutomationRequest, MarketSummary, ResponseEnvelope, ResponseStatus};

use self::breaker::{BreakerConfig, BreakerSet, CircuitState};
use self::fallback::fallback_reply;
use self::routing::{RequestKind, RoutePlan};

/// Fixed-window rate limiter state.
struct RateWindow {
    window_start: Instant,
    count: u32,
}

#[derive(Default)]
struct Counters {
    total: u64,
    succeeded: u64,
    failed: u64,
    rejected: u64,
    per_agent: HashMap<String, AgentCounters>,
}

#[derive(Default, Clone, Serialize)]
struct AgentCounters {
    requests: u64,
    errors: u64,
}

/// The dispatcher. Routes a request to the matching agents, aggregates their
/// replies into one envelope, and flattens every failure into an error
/// envelope — nothing panics across this boundary.
pub struct Orchestrator {
    registry: AgentRegistry,
    breakers: BreakerSet,
    metrics: Option<Arc<PlatformMetrics>>,
    limits: OrchestratorConfig,
    active: AtomicUsize,
    rate: Mutex<RateWindow>,
    counters: Mutex<Counters>,
    started_at: Instant,
}

impl Orchestrator {
    pub fn new(registry: AgentRegistry, limits: OrchestratorConfig) -> Self {
        let breaker_config = BreakerConfig::from(&limits);
        Self {
            registry,
            breakers: BreakerSet::new(breaker_config),
            metrics: None,
            limits,
            active: AtomicUsize::new(0),
            rate: Mutex::new(RateWindow {
                window_start: Instant::now(),
                count: 0,
            }),
            counters: Mutex::new(Counters::default()),
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PlatformMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Process one request end to end. Never returns an error: every failure
    /// mode is flattened into an error envelope with a `status` field.
    pub async fn process(&self, request: &AutomationRequest) -> ResponseEnvelope {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let plan = routing::plan(request);
        let kind = plan.kind.label();

        tracing::info!(
            request_id = %request_id,
            kind = %kind,
            agents = plan.agents.len(),
            "processing request"
        );

        if let Err(e) = self.admit() {
            if let Some(m) = &self.metrics {
                m.request_rejected();
            }
            self.counters.lock().expect("counters lock poisoned").rejected += 1;
            return ResponseEnvelope::error(request_id, kind, &e);
        }
        if let Some(m) = &self.metrics {
            m.request_started();
        }

        let timeout = Duration::from_secs(self.limits.request_timeout_seconds);
        let result = tokio::time::timeout(timeout, self.dispatch(request_id, request, &plan)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let mut envelope = match result {
            Ok(envelope) => envelope,
            Err(_) => {
                let err = Error::Timeout(self.limits.request_timeout_seconds);
                tracing::warn!(request_id = %request_id, "request timed out");
                ResponseEnvelope::error(request_id, kind, &err)
            }
        };
        envelope.processing_ms = started.elapsed().as_millis() as u64;

        let failed = envelope.status == ResponseStatus::Error;
        {
            let mut counters = self.counters.lock().expect("counters lock poisoned");
            counters.total += 1;
            if failed {
                counters.failed += 1;
            } else {
                counters.succeeded += 1;
            }
        }
        if let Some(m) = &self.metrics {
            m.request_finished(kind, failed, started.elapsed().as_secs_f64());
        }
        envelope
    }

    async fn dispatch(
        &self,
        request_id: Uuid,
        request: &AutomationRequest,
        plan: &RoutePlan,
    ) -> ResponseEnvelope {
        let profile = request.profile();
        let mut results = BTreeMap::new();

        for agent in &plan.agents {
            let reply = self.call_agent(agent, request, &profile).await;
            results.insert(agent.to_string(), reply);
        }

        let message = match plan.kind {
            RequestKind::Website => "Website solution prepared",
            RequestKind::Marketing => "Marketing strategy prepared",
            RequestKind::Analytics => "Analytics pipeline completed",
            RequestKind::Communication | RequestKind::General => {
                "Customer communication handled"
            }
            RequestKind::Complete => "Complete business automation prepared",
        };

        ResponseEnvelope {
            status: ResponseStatus::Success,
            request_id,
            kind: plan.kind.label().to_string(),
            message: Some(message.to_string()),
            results,
            error: None,
            market: Some(MarketSummary::from(&profile)),
            processing_ms: 0,
        }
    }

    /// Call one agent behind its circuit breaker. An open circuit or an
    /// agent error degrades to a fallback/error reply; the aggregation never
    /// loses the slot.
    async fn call_agent(
        &self,
        name: &str,
        request: &AutomationRequest,
        profile: &BusinessProfile,
    ) -> AgentReply {
        if let Some(m) = &self.metrics {
            m.agent_called(name);
        }
        {
            let mut counters = self.counters.lock().expect("counters lock poisoned");
            counters.per_agent.entry(name.to_string()).or_default().requests += 1;
        }

        let circuit = self.breakers.for_agent(name);
        if !circuit.allow_request() {
            tracing::warn!(agent = %name, "circuit open, serving fallback");
            if let Some(m) = &self.metrics {
                m.agent_fallback(name);
            }
            return fallback_reply(name, profile);
        }

        match self.registry.call(name, request).await {
            Ok(reply) => {
                circuit.record_success();
                reply
            }
            Err(e) => {
                circuit.record_failure();
                tracing::error!(agent = %name, error = %e, "agent call failed");
                if let Some(m) = &self.metrics {
                    m.agent_errored(name);
                }
                let mut counters = self.counters.lock().expect("counters lock poisoned");
                counters.per_agent.entry(name.to_string()).or_default().errors += 1;
                AgentReply::failure(name.to_string(), &e)
            }
        }
    }

    fn admit(&self) -> Result<(), Error> {
        {
            let mut rate = self.rate.lock().expect("rate lock poisoned");
            if rate.window_start.elapsed() >= Duration::from_secs(60) {
                rate.window_start = Instant::now();
                rate.count = 0;
            }
            if rate.count >= self.limits.rate_limit_per_minute {
                return Err(Error::RateLimited);
            }
            rate.count += 1;
        }

        let previous = self.active.fetch_add(1, Ordering::SeqCst);
        if previous >= self.limits.max_concurrent_requests {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::CapacityExceeded);
        }
        Ok(())
    }

    /// Health snapshot: agent availability, circuit states, counters.
    pub fn status(&self) -> OrchestratorStatus {
        let circuit_states: HashMap<String, CircuitState> =
            self.breakers.states().into_iter().collect();
        let counters = self.counters.lock().expect("counters lock poisoned");

        let agents = self
            .registry
            .names()
            .into_iter()
            .map(|name| AgentAvailability {
                name: name.to_string(),
                circuit: circuit_states
                    .get(name)
                    .copied()
                    .unwrap_or(CircuitState::Closed),
                counters: counters.per_agent.get(name).cloned().unwrap_or_default(),
            })
            .collect();

        OrchestratorStatus {
            health: if counters.total == 0 || counters.failed * 5 < counters.total {
                "healthy"
            } else {
                "degraded"
            },
            uptime_seconds: self.started_at.elapsed().as_secs(),
            requests_total: counters.total,
            requests_succeeded: counters.succeeded,
            requests_failed: counters.failed,
            requests_rejected: counters.rejected,
            agents,
        }
    }

    /// Manually reset an agent's circuit breaker.
    pub fn reset_circuit(&self, agent: &str) {
        self.breakers.for_agent(agent).reset();
    }
}

/// Serializable health snapshot.
#[derive(Serialize)]
pub struct OrchestratorStatus {
    pub health: &'static str,
    pub uptime_seconds: u64,
    pub requests_total: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub requests_rejected: u64,
    pub agents: Vec<AgentAvailability>,
}

#[derive(Serialize)]
pub struct AgentAvailability {
    pub name: String,
    pub circuit: CircuitState,
    #[serde(flatten)]
    counters: AgentCounters,
}
