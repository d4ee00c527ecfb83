//! Degraded fallback replies served when an agent fails or its circuit is
//! open. Each fallback carries enough canned content to keep a multi-agent
//! aggregation useful, with placeholders substituted from the business
//! profile.

use serde_json::json;

use crate::business::BusinessProfile;
use crate::request::AgentReply;
use crate::template::render;

/// Build the fallback reply for an agent. Unknown agents get a generic
/// degraded envelope so the aggregation never loses a slot.
pub fn fallback_reply(agent: &str, profile: &BusinessProfile) -> AgentReply {
    let vars = profile.template_vars();
    let data = match agent {
        "website_builder" => json!({
            "pages": ["Home", "About", "Contact"],
            "features": ["Mobile-first responsive layout", "Contact form"],
        }),
        "content_manager" => json!({
            "headline": render("{business_name} — now in {location}", &vars),
            "about": render("{business_name} will be online soon.", &vars),
        }),
        "seo_optimizer" => json!({
            "keywords": [render("{business_type} in {location}", &vars)],
            "local_seo": true,
        }),
        "campaign_manager" => json!({
            "themes": ["Introductory offer for new customers"],
            "channels": ["social_media"],
        }),
        "social_media" => json!({
            "platforms": ["Instagram", "Facebook"],
            "hashtags": ["#localbusiness"],
        }),
        "data_collector" | "insights_engine" | "report_generator" => json!({
            "note": "analytics temporarily unavailable; retry shortly",
        }),
        "customer_communication" => json!({
            "reply": render(
                "Thanks for contacting {business_name}! We'll reply shortly.",
                &vars,
            ),
        }),
        _ => json!({}),
    };

    AgentReply::degraded(
        agent.to_string(),
        format!("{agent} is temporarily degraded; serving fallback content"),
        data,
    )
}
