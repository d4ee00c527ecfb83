use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::business::BusinessProfile;
use crate::error::Error;

/// An inbound automation request. All fields besides the description are
/// optional; missing routing hints are recovered by keyword detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationRequest {
    /// Explicit request kind ("website", "marketing", ...). Wins over
    /// keyword detection when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    /// Explicit action within the kind ("build", "seo", "campaign", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form extra payload forwarded to agents untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl AutomationRequest {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// The combined text used for detection: description plus any explicit
    /// hints, matching the original request-text concatenation.
    pub fn detection_text(&self) -> String {
        let mut text = self.description.clone();
        if let Some(bt) = &self.business_type {
            text.push(' ');
            text.push_str(bt);
        }
        if let Some(loc) = &self.location {
            text.push(' ');
            text.push_str(loc);
        }
        text
    }

    /// Derive the shared business profile for this request.
    pub fn profile(&self) -> BusinessProfile {
        BusinessProfile::derive(
            self.business_name.as_deref(),
            self.business_type.as_deref(),
            &self.detection_text(),
        )
    }
}

/// Status carried by every reply and envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    Degraded,
    Placeholder,
}

/// A single agent's reply. Every reply carries a `status` and the agent
/// name, so aggregated results stay attributable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub status: ResponseStatus,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReply {
    pub fn success(
        agent: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            agent: agent.into(),
            message: Some(message.into()),
            data,
            error: None,
        }
    }

    pub fn failure(agent: impl Into<String>, err: &Error) -> Self {
        Self {
            status: ResponseStatus::Error,
            agent: agent.into(),
            message: None,
            data: serde_json::Value::Null,
            error: Some(err.to_string()),
        }
    }

    pub fn degraded(
        agent: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            status: ResponseStatus::Degraded,
            agent: agent.into(),
            message: Some(message.into()),
            data,
            error: None,
        }
    }

    pub fn placeholder(agent: impl Into<String>) -> Self {
        let agent = agent.into();
        Self {
            status: ResponseStatus::Placeholder,
            message: Some(format!("{agent} agent is not yet fully implemented")),
            agent,
            data: serde_json::Value::Null,
            error: None,
        }
    }
}

/// Market summary attached to every successful envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub business_type: String,
    pub city: String,
    pub country: String,
    pub currency: String,
    pub language: String,
}

impl From<&BusinessProfile> for MarketSummary {
    fn from(profile: &BusinessProfile) -> Self {
        Self {
            business_type: profile.business_type.label().to_string(),
            city: profile.market.city.clone(),
            country: profile.market.country.clone(),
            currency: profile.market.currency.clone(),
            language: profile.market.language.clone(),
        }
    }
}

/// The orchestrator's final response: one envelope, one `status`, agent
/// replies keyed by agent name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: ResponseStatus,
    pub request_id: Uuid,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub results: BTreeMap<String, AgentReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketSummary>,
    #[serde(default)]
    pub processing_ms: u64,
}

impl ResponseEnvelope {
    pub fn error(request_id: Uuid, kind: impl Into<String>, err: &Error) -> Self {
        Self {
            status: ResponseStatus::Error,
            request_id,
            kind: kind.into(),
            message: None,
            results: BTreeMap::new(),
            error: Some(err.to_string()),
            market: None,
            processing_ms: 0,
        }
    }

    /// True when any aggregated reply is an error or degraded fallback.
    pub fn has_degraded_results(&self) -> bool {
        self.results
            .values()
            .any(|r| matches!(r.status, ResponseStatus::Error | ResponseStatus::Degraded))
    }
}
