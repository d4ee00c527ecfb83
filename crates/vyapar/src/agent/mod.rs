use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};

/// Whether an agent is ready to take requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Active,
    Inactive,
}

/// Trait for automation agents.
///
/// Uses `Pin<Box<dyn Future>>` return type for dyn-compatibility, allowing
/// agents to be stored as `Arc<dyn Agent>` in the registry.
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>>;

    fn state(&self) -> AgentState {
        AgentState::Active
    }
}

/// Name-keyed registry of agents. Routing looks agents up by name; a miss
/// is answered by a placeholder reply rather than an error.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<&'static str, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Duplicate names are rejected.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), Error> {
        let name = agent.name();
        if self.agents.contains_key(name) {
            return Err(Error::Agent(format!("agent '{name}' already registered")));
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent names in sorted order, for stable status output.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.agents.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Call an agent by name. A missing agent yields a placeholder reply so
    /// routing stays total over the agent name space.
    pub async fn call(&self, name: &str, request: &AutomationRequest) -> Result<AgentReply, Error> {
        match self.agents.get(name) {
            Some(agent) => agent.handle(request).await,
            None => Ok(AgentReply::placeholder(name.to_string())),
        }
    }
}

/// An agent that always answers with a placeholder envelope. Used to keep
/// the full agent name space routable before every agent is implemented.
pub struct PlaceholderAgent {
    name: &'static str,
}

impl PlaceholderAgent {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Agent for PlaceholderAgent {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        _request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move { Ok(AgentReply::placeholder(self.name)) })
    }
}
