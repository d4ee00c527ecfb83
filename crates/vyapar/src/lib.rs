pub mod agent;
pub mod agents;
pub mod artifact;
pub mod business;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod orchestrator;
pub mod request;
pub mod template;

pub use agent::{Agent, AgentRegistry, AgentState, PlaceholderAgent};
pub use agents::default_registry;
pub use artifact::ArtifactWriter;
pub use business::{BusinessProfile, BusinessType, Market, MarketTier, PricingTier};
pub use config::{DaemonConfig, OrchestratorConfig, PlatformConfig};
pub use daemon::{DaemonCore, DaemonHandle, InMemoryTaskStore, QueuedTask, TaskState, TaskStore};
pub use error::Error;
pub use gateway::{UpiGateway, UpiProvider, WhatsAppClient};
pub use metrics::PlatformMetrics;
pub use orchestrator::routing::RequestKind;
pub use orchestrator::{Orchestrator, OrchestratorStatus};
pub use request::{AgentReply, AutomationRequest, ResponseEnvelope, ResponseStatus};
