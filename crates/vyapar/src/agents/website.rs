use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::agent::Agent;
use crate::business::BusinessType;
use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};
use crate::template::{content_for, render, render_all};

/// Produces the site blueprint: pages, features, and market-specific
/// integrations (UPI checkout and WhatsApp chat for Indian businesses).
pub struct WebsiteBuilderAgent;

impl Agent for WebsiteBuilderAgent {
    fn name(&self) -> &'static str {
        "website_builder"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();

            let mut pages = vec!["Home", "About", "Contact"];
            match profile.business_type {
                BusinessType::Restaurant => pages.insert(2, "Menu"),
                BusinessType::Retail => pages.insert(2, "Catalogue"),
                BusinessType::Service => pages.insert(2, "Services"),
            }

            let mut features = vec![
                "Mobile-first responsive layout",
                "Contact form with enquiry notifications",
                "Google Maps embed",
            ];
            if profile.market.country == "IN" {
                features.push("UPI payment checkout");
                features.push("WhatsApp chat button");
            }
            if profile.market.language.starts_with("hi") {
                features.push("Hindi/English bilingual toggle");
            }

            let data = json!({
                "pages": pages,
                "features": features,
                "theme": profile.business_type.label(),
                "market": profile.market,
            });
            Ok(AgentReply::success(
                self.name(),
                "Website blueprint prepared",
                data,
            ))
        })
    }
}

/// Renders the page copy for the detected business type.
pub struct ContentManagerAgent;

impl Agent for ContentManagerAgent {
    fn name(&self) -> &'static str {
        "content_manager"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();
            let content = content_for(profile.business_type);

            let data = json!({
                "headline": render(content.headline, &vars),
                "about": render(content.about, &vars),
                "services": content.services,
                "language": profile.market.language,
                "bilingual": profile.market.language.contains('-'),
            });
            Ok(AgentReply::success(
                self.name(),
                "Page content generated",
                data,
            ))
        })
    }
}

/// SEO score component weights. The components themselves are fixed
/// constants per business type; only keyword coverage varies.
const SEO_WEIGHTS: [(&str, f64); 4] = [
    ("content_quality", 0.3),
    ("keyword_coverage", 0.3),
    ("mobile_readiness", 0.2),
    ("local_signals", 0.2),
];

fn seo_components(business_type: BusinessType, keyword_count: usize) -> Vec<(&'static str, u32)> {
    let base = match business_type {
        BusinessType::Restaurant => 84,
        BusinessType::Retail => 81,
        BusinessType::Service => 79,
    };
    vec![
        ("content_quality", base),
        ("keyword_coverage", (60 + 5 * keyword_count as u32).min(95)),
        ("mobile_readiness", 90),
        ("local_signals", 75),
    ]
}

fn seo_overall(components: &[(&'static str, u32)]) -> f64 {
    SEO_WEIGHTS
        .iter()
        .map(|(name, weight)| {
            let score = components
                .iter()
                .find(|(c, _)| c == name)
                .map(|(_, s)| *s)
                .unwrap_or(0);
            weight * f64::from(score)
        })
        .sum()
}

/// Produces the keyword plan and the weighted SEO score.
pub struct SeoOptimizerAgent;

impl Agent for SeoOptimizerAgent {
    fn name(&self) -> &'static str {
        "seo_optimizer"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();
            let content = content_for(profile.business_type);

            let keywords = render_all(content.seo_keywords, &vars);
            let components = seo_components(profile.business_type, keywords.len());
            let overall = seo_overall(&components);

            let data = json!({
                "keywords": keywords,
                "local_seo": true,
                "google_business_profile": true,
                "score_components": components
                    .iter()
                    .map(|(name, score)| (name.to_string(), *score))
                    .collect::<std::collections::BTreeMap<_, _>>(),
                "overall_score": overall,
            });
            Ok(AgentReply::success(
                self.name(),
                "SEO plan prepared",
                data,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseStatus;

    fn restaurant_request() -> AutomationRequest {
        AutomationRequest {
            business_name: Some("Sharma Dhaba".into()),
            description: "website for my dhaba in Jaipur".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builder_adds_menu_page_for_restaurants() {
        let reply = WebsiteBuilderAgent.handle(&restaurant_request()).await.unwrap();
        assert_eq!(reply.status, ResponseStatus::Success);
        let pages = reply.data["pages"].as_array().unwrap();
        assert!(pages.iter().any(|p| p == "Menu"));
    }

    #[tokio::test]
    async fn builder_includes_upi_for_indian_market() {
        let reply = WebsiteBuilderAgent.handle(&restaurant_request()).await.unwrap();
        let features = reply.data["features"].as_array().unwrap();
        assert!(features.iter().any(|f| f == "UPI payment checkout"));
        assert!(features.iter().any(|f| f == "WhatsApp chat button"));
    }

    #[tokio::test]
    async fn builder_skips_upi_outside_india() {
        let req = AutomationRequest::from_description("salon website in London");
        let reply = WebsiteBuilderAgent.handle(&req).await.unwrap();
        let features = reply.data["features"].as_array().unwrap();
        assert!(!features.iter().any(|f| f == "UPI payment checkout"));
    }

    #[tokio::test]
    async fn content_renders_business_name() {
        let reply = ContentManagerAgent.handle(&restaurant_request()).await.unwrap();
        let headline = reply.data["headline"].as_str().unwrap();
        assert!(headline.contains("Sharma Dhaba"));
        assert!(!headline.contains("{business_name}"));
        assert_eq!(reply.data["bilingual"], true);
    }

    #[tokio::test]
    async fn seo_keywords_are_rendered_and_scored() {
        let reply = SeoOptimizerAgent.handle(&restaurant_request()).await.unwrap();
        let keywords = reply.data["keywords"].as_array().unwrap();
        assert!(!keywords.is_empty());
        assert!(keywords.iter().all(|k| !k.as_str().unwrap().contains('{')));

        let overall = reply.data["overall_score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&overall));
    }

    #[test]
    fn seo_overall_is_weighted_sum() {
        let components = vec![
            ("content_quality", 80),
            ("keyword_coverage", 80),
            ("mobile_readiness", 80),
            ("local_signals", 80),
        ];
        let overall = seo_overall(&components);
        assert!((overall - 80.0).abs() < 1e-9);
    }

    #[test]
    fn seo_keyword_coverage_caps_at_95() {
        let components = seo_components(BusinessType::Retail, 50);
        let coverage = components
            .iter()
            .find(|(name, _)| *name == "keyword_coverage")
            .unwrap()
            .1;
        assert_eq!(coverage, 95);
    }
}
