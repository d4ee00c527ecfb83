use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::agent::Agent;
use crate::business::detect_festival;
use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};
use crate::template::{content_for, render, render_all};

/// Builds the campaign plan: themes, budget packages in the market's
/// currency, and festival context when the request mentions one.
pub struct CampaignManagerAgent;

impl Agent for CampaignManagerAgent {
    fn name(&self) -> &'static str {
        "campaign_manager"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();
            let content = content_for(profile.business_type);
            let festival = detect_festival(&request.detection_text());

            let mut themes = render_all(content.campaign_themes, &vars);
            if let Some(name) = festival {
                themes.insert(0, format!("{name} special: limited-time festive offers"));
            }

            let currency = &profile.market.currency_symbol;
            let data = json!({
                "themes": themes,
                "channels": ["social_media", "whatsapp", "local_listings"],
                "budget_packages": {
                    "starter": format!("{currency}{}/month", profile.pricing.starter_monthly),
                    "growth": format!("{currency}{}/month", profile.pricing.growth_monthly),
                    "premium": format!("{currency}{}/month", profile.pricing.premium_monthly),
                },
                "festival": festival,
            });
            Ok(AgentReply::success(
                self.name(),
                "Campaign plan prepared",
                data,
            ))
        })
    }
}

/// Engagement prediction: a trivial weighted sum of plan booleans. This is
/// data shaping, not analytics — the platform does not measure anything.
fn engagement_prediction(has_hashtags: bool, has_calendar: bool, bilingual: bool) -> f64 {
    let mut score = 2.1;
    if has_hashtags {
        score += 0.8;
    }
    if has_calendar {
        score += 0.6;
    }
    if bilingual {
        score += 0.4;
    }
    score
}

const POSTING_CALENDAR: &[(&str, &str)] = &[
    ("Monday", "Behind-the-scenes"),
    ("Wednesday", "Product/menu highlight"),
    ("Friday", "Customer story"),
    ("Sunday", "Weekly offer announcement"),
];

/// Platform plan, hashtags, posting calendar, and the engagement estimate.
pub struct SocialMediaAgent;

impl Agent for SocialMediaAgent {
    fn name(&self) -> &'static str {
        "social_media"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();
            let content = content_for(profile.business_type);

            let mut platforms = vec!["Instagram", "Facebook"];
            if profile.market.country == "IN" {
                platforms.push("WhatsApp Business");
            }

            let hashtags = render_all(content.hashtags, &vars);
            let bilingual = profile.market.language.contains('-');
            let calendar: Vec<_> = POSTING_CALENDAR
                .iter()
                .map(|(day, theme)| json!({"day": day, "theme": theme}))
                .collect();

            let data = json!({
                "platforms": platforms,
                "hashtags": hashtags,
                "posting_calendar": calendar,
                "engagement_prediction": {
                    "weekly_growth_pct": engagement_prediction(true, true, bilingual),
                    "basis": "plan completeness",
                },
            });
            Ok(AgentReply::success(
                self.name(),
                "Social media plan prepared",
                data,
            ))
        })
    }
}

/// Neighbourhood-level marketing suggestions.
pub struct LocalMarketingAgent;

impl Agent for LocalMarketingAgent {
    fn name(&self) -> &'static str {
        "local_marketing"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();

            let initiatives = vec![
                render("List {business_name} on local directories in {location}", &vars),
                render("Partner with nearby businesses for cross-promotions", &vars),
                render("Distribute opening-offer flyers around {location}", &vars),
            ];

            let data = json!({
                "initiatives": initiatives,
                "market_tier": profile.market.tier,
                "google_business_profile": true,
            });
            Ok(AgentReply::success(
                self.name(),
                "Local marketing plan prepared",
                data,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseStatus;

    #[tokio::test]
    async fn campaign_includes_festival_theme() {
        let req = AutomationRequest::from_description("Diwali campaign for my shop in Delhi");
        let reply = CampaignManagerAgent.handle(&req).await.unwrap();
        assert_eq!(reply.status, ResponseStatus::Success);
        assert_eq!(reply.data["festival"], "Diwali");
        let themes = reply.data["themes"].as_array().unwrap();
        assert!(themes[0].as_str().unwrap().starts_with("Diwali"));
    }

    #[tokio::test]
    async fn campaign_without_festival() {
        let req = AutomationRequest::from_description("promote my salon in Pune");
        let reply = CampaignManagerAgent.handle(&req).await.unwrap();
        assert!(reply.data["festival"].is_null());
    }

    #[tokio::test]
    async fn campaign_budget_uses_market_currency() {
        let req = AutomationRequest::from_description("campaign for my store in Mumbai");
        let reply = CampaignManagerAgent.handle(&req).await.unwrap();
        let starter = reply.data["budget_packages"]["starter"].as_str().unwrap();
        assert!(starter.starts_with('₹'));
        assert!(starter.ends_with("/month"));
    }

    #[tokio::test]
    async fn social_adds_whatsapp_for_india() {
        let req = AutomationRequest::from_description("social media for my cafe in Mumbai");
        let reply = SocialMediaAgent.handle(&req).await.unwrap();
        let platforms = reply.data["platforms"].as_array().unwrap();
        assert!(platforms.iter().any(|p| p == "WhatsApp Business"));
    }

    #[tokio::test]
    async fn social_hashtags_are_rendered() {
        let req = AutomationRequest::from_description("instagram plan for a cafe in Mumbai");
        let reply = SocialMediaAgent.handle(&req).await.unwrap();
        let hashtags = reply.data["hashtags"].as_array().unwrap();
        assert!(hashtags.iter().all(|h| !h.as_str().unwrap().contains('{')));
    }

    #[test]
    fn engagement_prediction_is_monotonic() {
        let none = engagement_prediction(false, false, false);
        let all = engagement_prediction(true, true, true);
        assert!(all > none);
        assert!((all - 3.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn local_marketing_mentions_location() {
        let req = AutomationRequest::from_description("community marketing for a clinic in Jaipur");
        let reply = LocalMarketingAgent.handle(&req).await.unwrap();
        let initiatives = reply.data["initiatives"].as_array().unwrap();
        assert!(initiatives
            .iter()
            .any(|i| i.as_str().unwrap().contains("Jaipur")));
    }
}
