use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::agent::Agent;
use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};

/// A named quality check with its weight and pass/fail result.
#[derive(Debug, Clone)]
struct Check {
    name: &'static str,
    weight: f64,
    passed: bool,
}

fn run_checks(request: &AutomationRequest) -> Vec<Check> {
    let profile = request.profile();
    vec![
        Check {
            name: "request_completeness",
            weight: 0.25,
            passed: !request.description.trim().is_empty(),
        },
        Check {
            name: "business_identified",
            weight: 0.25,
            passed: request.business_name.is_some(),
        },
        Check {
            name: "market_resolved",
            weight: 0.2,
            passed: !profile.market.country.is_empty(),
        },
        Check {
            name: "compliance_ready",
            weight: 0.3,
            // Indian businesses need GST-ready invoicing before launch.
            passed: profile.market.country != "IN" || request.payload.is_some(),
        },
    ]
}

/// Weighted score over the checks, scaled to 0–100.
fn score(checks: &[Check]) -> f64 {
    let total: f64 = checks.iter().map(|c| c.weight).sum();
    if total == 0.0 {
        return 0.0;
    }
    let passed: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();
    (passed / total) * 100.0
}

fn grade(score: f64) -> &'static str {
    if score >= 85.0 {
        "A"
    } else if score >= 70.0 {
        "B"
    } else {
        "C"
    }
}

/// Validates a request (or an aggregated result passed in the payload) and
/// grades it against the platform's launch checklist.
pub struct QualityControlAgent;

impl Agent for QualityControlAgent {
    fn name(&self) -> &'static str {
        "quality_control"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let checks = run_checks(request);
            let overall = score(&checks);

            let failed: Vec<&str> = checks
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.name)
                .collect();
            let recommendations: Vec<String> = failed
                .iter()
                .map(|name| format!("Resolve failing check: {name}"))
                .collect();

            let data = json!({
                "checks": checks
                    .iter()
                    .map(|c| json!({"name": c.name, "weight": c.weight, "passed": c.passed}))
                    .collect::<Vec<_>>(),
                "overall_score": overall,
                "grade": grade(overall),
                "launch_ready": overall >= 85.0,
                "recommendations": recommendations,
            });
            Ok(AgentReply::success(
                self.name(),
                "Quality assessment complete",
                data,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseStatus;

    #[test]
    fn score_is_weighted() {
        let checks = vec![
            Check {
                name: "a",
                weight: 0.75,
                passed: true,
            },
            Check {
                name: "b",
                weight: 0.25,
                passed: false,
            },
        ];
        assert!((score(&checks) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn score_empty_checks_is_zero() {
        assert_eq!(score(&[]), 0.0);
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade(90.0), "A");
        assert_eq!(grade(85.0), "A");
        assert_eq!(grade(75.0), "B");
        assert_eq!(grade(50.0), "C");
    }

    #[tokio::test]
    async fn complete_request_grades_a() {
        let req = AutomationRequest {
            business_name: Some("Sharma Dhaba".into()),
            description: "full setup for my restaurant in Mumbai".into(),
            payload: Some(json!({"gst_number": "27AAAAA0000A1Z5"})),
            ..Default::default()
        };
        let reply = QualityControlAgent.handle(&req).await.unwrap();
        assert_eq!(reply.status, ResponseStatus::Success);
        assert_eq!(reply.data["grade"], "A");
        assert_eq!(reply.data["launch_ready"], true);
        assert!(reply.data["recommendations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn incomplete_request_gets_recommendations() {
        let req = AutomationRequest::from_description("website for a shop in Delhi");
        let reply = QualityControlAgent.handle(&req).await.unwrap();
        let recs = reply.data["recommendations"].as_array().unwrap();
        assert!(!recs.is_empty());
        assert_eq!(reply.data["launch_ready"], false);
    }
}
