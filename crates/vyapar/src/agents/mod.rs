//! Concrete agents. Each one derives the shared [`crate::business`] profile,
//! pulls canned content from [`crate::template`], and returns an
//! [`crate::request::AgentReply`] — never its own envelope shape.

pub mod analytics;
pub mod communication;
pub mod marketing;
pub mod quality;
pub mod website;

use std::sync::Arc;

use crate::agent::AgentRegistry;
use crate::artifact::ArtifactWriter;
use crate::error::Error;

/// Build the full production registry: every agent the router can name.
pub fn default_registry(writer: Option<Arc<ArtifactWriter>>) -> Result<AgentRegistry, Error> {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(website::WebsiteBuilderAgent))?;
    registry.register(Arc::new(website::ContentManagerAgent))?;
    registry.register(Arc::new(website::SeoOptimizerAgent))?;
    registry.register(Arc::new(marketing::CampaignManagerAgent))?;
    registry.register(Arc::new(marketing::SocialMediaAgent))?;
    registry.register(Arc::new(marketing::LocalMarketingAgent))?;
    registry.register(Arc::new(analytics::DataCollectorAgent))?;
    registry.register(Arc::new(analytics::InsightsEngineAgent))?;
    registry.register(Arc::new(analytics::ReportGeneratorAgent::new(writer)))?;
    registry.register(Arc::new(communication::CustomerCommunicationAgent))?;
    registry.register(Arc::new(quality::QualityControlAgent))?;
    Ok(registry)
}
