//! Request classification and route planning. An explicit `type` field wins;
//! otherwise the lowercased description is matched against keyword tables
//! (English and Hindi). `complete` keywords take precedence over everything
//! else, matching the original routing order.

use serde::{Deserialize, Serialize};

use crate::business::detect_festival;
use crate::request::AutomationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Website,
    Marketing,
    Analytics,
    Communication,
    Complete,
    General,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Website => "website",
            RequestKind::Marketing => "marketing",
            RequestKind::Analytics => "analytics",
            RequestKind::Communication => "communication",
            RequestKind::Complete => "complete",
            RequestKind::General => "general",
        }
    }

    fn from_explicit(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "website" => Some(RequestKind::Website),
            "marketing" => Some(RequestKind::Marketing),
            "analytics" => Some(RequestKind::Analytics),
            "communication" => Some(RequestKind::Communication),
            "complete" | "full" => Some(RequestKind::Complete),
            _ => None,
        }
    }
}

const COMPLETE_KEYWORDS: &[&str] = &[
    "complete",
    "full setup",
    "everything",
    "start business",
    "पूरा",
    "सब कुछ",
    "संपूर्ण",
];

const WEBSITE_KEYWORDS: &[&str] = &[
    "website", "site", "web page", "online presence", "वेबसाइट", "साइट",
];

const MARKETING_KEYWORDS: &[&str] = &[
    "marketing",
    "advertise",
    "promote",
    "campaign",
    "social media",
    "instagram",
    "facebook",
    "festival",
    "मार्केटिंग",
    "विज्ञापन",
    "प्रचार",
    "अभियान",
];

const ANALYTICS_KEYWORDS: &[&str] = &[
    "analytics",
    "report",
    "insights",
    "dashboard",
    "statistics",
    "एनालिटिक्स",
    "रिपोर्ट",
    "डेटा",
];

const COMMUNICATION_KEYWORDS: &[&str] = &[
    "whatsapp",
    "customer message",
    "support",
    "chat",
    "reply",
    "व्हाट्सएप",
    "संचार",
    "ग्राहक",
];

/// Classify a request. Explicit `type` wins; a festival mention implies
/// `Marketing` (festival campaigns were the platform's founding use case).
pub fn classify(request: &AutomationRequest) -> RequestKind {
    if let Some(explicit) = request
        .request_type
        .as_deref()
        .and_then(RequestKind::from_explicit)
    {
        return explicit;
    }

    let text = request.detection_text().to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if matches(COMPLETE_KEYWORDS) {
        RequestKind::Complete
    } else if matches(WEBSITE_KEYWORDS) {
        RequestKind::Website
    } else if matches(MARKETING_KEYWORDS) || detect_festival(&text).is_some() {
        RequestKind::Marketing
    } else if matches(ANALYTICS_KEYWORDS) {
        RequestKind::Analytics
    } else if matches(COMMUNICATION_KEYWORDS) {
        RequestKind::Communication
    } else {
        RequestKind::General
    }
}

/// The agents to call for a classified request, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub kind: RequestKind,
    pub agents: Vec<&'static str>,
    pub festival: Option<&'static str>,
}

const WEBSITE_TRIO: [&str; 3] = ["website_builder", "content_manager", "seo_optimizer"];
const MARKETING_TRIO: [&str; 3] = ["campaign_manager", "social_media", "local_marketing"];
const ANALYTICS_TRIO: [&str; 3] = ["data_collector", "insights_engine", "report_generator"];

fn website_agents(action: Option<&str>, text: &str) -> Vec<&'static str> {
    let action = action.map(str::to_lowercase).unwrap_or_else(|| {
        if ["create", "build", "develop", "बनाना"].iter().any(|k| text.contains(k)) {
            "build".into()
        } else if ["update", "modify", "change", "अपडेट"].iter().any(|k| text.contains(k)) {
            "content".into()
        } else if ["seo", "optimize", "ranking", "एसईओ"].iter().any(|k| text.contains(k)) {
            "seo".into()
        } else {
            String::new()
        }
    });
    match action.as_str() {
        // A build auto-includes content and SEO for a complete setup.
        "build" | "create" | "develop" => WEBSITE_TRIO.to_vec(),
        "content" | "update" | "modify" => vec!["content_manager"],
        "seo" | "optimize" | "ranking" => vec!["seo_optimizer"],
        _ => WEBSITE_TRIO.to_vec(),
    }
}

fn marketing_agents(action: Option<&str>, text: &str, festival: bool) -> Vec<&'static str> {
    let action = action.map(str::to_lowercase).unwrap_or_else(|| {
        if ["campaign", "advertise", "promote", "अभियान"].iter().any(|k| text.contains(k)) {
            "campaign".into()
        } else if ["social", "instagram", "facebook", "सोशल"].iter().any(|k| text.contains(k)) {
            "social".into()
        } else if ["local", "community", "स्थानीय"].iter().any(|k| text.contains(k)) {
            "local".into()
        } else {
            String::new()
        }
    });
    // A festival mention always gets the campaign + social pairing.
    if festival || matches!(action.as_str(), "campaign" | "advertise" | "promote") {
        return vec!["campaign_manager", "social_media"];
    }
    match action.as_str() {
        "social" | "instagram" | "facebook" => vec!["social_media"],
        "local" | "regional" | "community" => vec!["local_marketing"],
        _ => MARKETING_TRIO.to_vec(),
    }
}

fn analytics_agents(action: Option<&str>, text: &str) -> Vec<&'static str> {
    let action = action.map(str::to_lowercase).unwrap_or_else(|| {
        if ["collect", "gather"].iter().any(|k| text.contains(k)) {
            "collect".into()
        } else if ["insight", "analyze", "trend"].iter().any(|k| text.contains(k)) {
            "insights".into()
        } else if ["report", "summary", "dashboard"].iter().any(|k| text.contains(k)) {
            "report".into()
        } else {
            String::new()
        }
    });
    match action.as_str() {
        "collect" | "gather" | "data" => vec!["data_collector"],
        "analyze" | "insights" | "trends" => vec!["insights_engine"],
        "report" | "summary" | "dashboard" => vec!["report_generator"],
        // No specific action: run the whole pipeline.
        _ => ANALYTICS_TRIO.to_vec(),
    }
}

/// Build the route plan for a request.
pub fn plan(request: &AutomationRequest) -> RoutePlan {
    let kind = classify(request);
    let text = request.detection_text().to_lowercase();
    let festival = detect_festival(&text);
    let action = request.action.as_deref();

    let agents = match kind {
        RequestKind::Website => website_agents(action, &text),
        RequestKind::Marketing => marketing_agents(action, &text, festival.is_some()),
        RequestKind::Analytics => analytics_agents(action, &text),
        RequestKind::Communication | RequestKind::General => vec!["customer_communication"],
        RequestKind::Complete => {
            let mut agents: Vec<&'static str> = Vec::new();
            agents.extend(WEBSITE_TRIO);
            agents.extend(MARKETING_TRIO);
            agents.extend(ANALYTICS_TRIO);
            agents.push("quality_control");
            agents
        }
    };

    RoutePlan {
        kind,
        agents,
        festival,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(description: &str) -> AutomationRequest {
        AutomationRequest::from_description(description)
    }

    #[test]
    fn explicit_type_wins_over_keywords() {
        let request = AutomationRequest {
            request_type: Some("analytics".into()),
            description: "build a website".into(),
            ..Default::default()
        };
        assert_eq!(classify(&request), RequestKind::Analytics);
    }

    #[test]
    fn complete_keywords_beat_everything() {
        assert_eq!(
            classify(&req("complete website and marketing setup")),
            RequestKind::Complete
        );
        assert_eq!(classify(&req("पूरा setup चाहिए")), RequestKind::Complete);
    }

    #[test]
    fn website_keywords_classify() {
        assert_eq!(classify(&req("I need a website")), RequestKind::Website);
        assert_eq!(classify(&req("वेबसाइट बनाओ")), RequestKind::Website);
    }

    #[test]
    fn marketing_keywords_classify() {
        assert_eq!(classify(&req("run a campaign")), RequestKind::Marketing);
        assert_eq!(classify(&req("मार्केटिंग करो")), RequestKind::Marketing);
    }

    #[test]
    fn festival_mention_implies_marketing() {
        assert_eq!(classify(&req("Diwali offers for my shop?")), RequestKind::Marketing);
    }

    #[test]
    fn unknown_text_is_general() {
        assert_eq!(classify(&req("something unrelated")), RequestKind::General);
    }

    #[test]
    fn general_routes_to_customer_communication() {
        let plan = plan(&req("something unrelated"));
        assert_eq!(plan.kind, RequestKind::General);
        assert_eq!(plan.agents, vec!["customer_communication"]);
    }

    #[test]
    fn website_build_auto_includes_content_and_seo() {
        let plan = plan(&req("create a website for my cafe"));
        assert_eq!(plan.kind, RequestKind::Website);
        assert_eq!(
            plan.agents,
            vec!["website_builder", "content_manager", "seo_optimizer"]
        );
    }

    #[test]
    fn website_seo_action_routes_narrowly() {
        let request = AutomationRequest {
            request_type: Some("website".into()),
            action: Some("seo".into()),
            description: "improve ranking".into(),
            ..Default::default()
        };
        assert_eq!(plan(&request).agents, vec!["seo_optimizer"]);
    }

    #[test]
    fn festival_campaign_pairs_campaign_and_social() {
        let plan = plan(&req("Holi प्रचार for my store"));
        assert_eq!(plan.kind, RequestKind::Marketing);
        assert_eq!(plan.festival, Some("Holi"));
        assert_eq!(plan.agents, vec!["campaign_manager", "social_media"]);
    }

    #[test]
    fn analytics_without_action_runs_pipeline() {
        let request = AutomationRequest {
            request_type: Some("analytics".into()),
            description: String::new(),
            ..Default::default()
        };
        assert_eq!(
            plan(&request).agents,
            vec!["data_collector", "insights_engine", "report_generator"]
        );
    }

    #[test]
    fn analytics_report_action_routes_narrowly() {
        let request = AutomationRequest {
            request_type: Some("analytics".into()),
            action: Some("report".into()),
            ..Default::default()
        };
        assert_eq!(plan(&request).agents, vec!["report_generator"]);
    }

    #[test]
    fn complete_fans_out_across_all_domains() {
        let plan = plan(&req("complete business setup please"));
        assert_eq!(plan.agents.len(), 10);
        assert!(plan.agents.contains(&"quality_control"));
        assert!(plan.agents.contains(&"website_builder"));
        assert!(plan.agents.contains(&"report_generator"));
    }

    #[test]
    fn kind_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&RequestKind::Complete).unwrap(),
            r#""complete""#
        );
    }
}
