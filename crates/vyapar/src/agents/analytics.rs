use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rand::Rng;
use serde_json::json;

use crate::agent::Agent;
use crate::artifact::ArtifactWriter;
use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};

const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Generate a week of sample metrics. There is no real analytics pipeline
/// behind the platform; demo data stands in until one exists.
fn sample_week() -> Vec<serde_json::Value> {
    let mut rng = rand::thread_rng();
    DAYS.iter()
        .map(|day| {
            let visitors: u32 = rng.gen_range(50..500);
            let enquiries: u32 = rng.gen_range(2..40);
            let orders: u32 = rng.gen_range(0..enquiries + 1);
            json!({
                "day": day,
                "visitors": visitors,
                "enquiries": enquiries,
                "orders": orders,
                "revenue": orders * rng.gen_range(150..900),
            })
        })
        .collect()
}

/// Collects (sample) metrics for the requested business.
pub struct DataCollectorAgent;

impl Agent for DataCollectorAgent {
    fn name(&self) -> &'static str {
        "data_collector"
    }

    fn handle<'a>(
        &'a self,
        _request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let data = json!({
                "period": "last_7_days",
                "metrics": sample_week(),
                "sample_data": true,
            });
            Ok(AgentReply::success(
                self.name(),
                "Weekly metrics collected",
                data,
            ))
        })
    }
}

/// Totals across a week of metric rows.
#[derive(Debug, Default, PartialEq)]
struct WeekTotals {
    visitors: u64,
    enquiries: u64,
    orders: u64,
    revenue: u64,
}

fn totals(metrics: &[serde_json::Value]) -> WeekTotals {
    let sum = |key: &str| -> u64 {
        metrics
            .iter()
            .filter_map(|row| row[key].as_u64())
            .sum()
    };
    WeekTotals {
        visitors: sum("visitors"),
        enquiries: sum("enquiries"),
        orders: sum("orders"),
        revenue: sum("revenue"),
    }
}

/// Growth score: a weighted sum of simple health checks over the totals.
fn growth_score(t: &WeekTotals) -> f64 {
    let conversion = if t.enquiries > 0 {
        t.orders as f64 / t.enquiries as f64
    } else {
        0.0
    };
    let mut score = 40.0;
    if t.visitors > 700 {
        score += 25.0;
    }
    if conversion > 0.4 {
        score += 20.0;
    }
    if t.enquiries > 50 {
        score += 15.0;
    }
    score
}

fn recommendations(t: &WeekTotals) -> Vec<&'static str> {
    let mut out = Vec::new();
    if t.visitors <= 700 {
        out.push("Increase visibility: run a local awareness campaign");
    }
    if t.enquiries > 0 && (t.orders as f64 / t.enquiries as f64) <= 0.4 {
        out.push("Follow up enquiries within an hour to lift conversion");
    }
    if out.is_empty() {
        out.push("Maintain the current plan and review again next week");
    }
    out
}

/// Derives insight scores from collected metrics. Accepts metrics in the
/// request payload; generates a sample week otherwise.
pub struct InsightsEngineAgent;

impl Agent for InsightsEngineAgent {
    fn name(&self) -> &'static str {
        "insights_engine"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let metrics: Vec<serde_json::Value> = request
                .payload
                .as_ref()
                .and_then(|p| p.get("metrics"))
                .and_then(|m| m.as_array())
                .cloned()
                .unwrap_or_else(sample_week);

            let t = totals(&metrics);
            let data = json!({
                "totals": {
                    "visitors": t.visitors,
                    "enquiries": t.enquiries,
                    "orders": t.orders,
                    "revenue": t.revenue,
                },
                "growth_score": growth_score(&t),
                "recommendations": recommendations(&t),
            });
            Ok(AgentReply::success(
                self.name(),
                "Insights generated",
                data,
            ))
        })
    }
}

/// Renders the weekly report and persists it as JSON, CSV and Markdown
/// deliverables when an artifact writer is configured.
pub struct ReportGeneratorAgent {
    writer: Option<Arc<ArtifactWriter>>,
}

impl ReportGeneratorAgent {
    pub fn new(writer: Option<Arc<ArtifactWriter>>) -> Self {
        Self { writer }
    }
}

impl Agent for ReportGeneratorAgent {
    fn name(&self) -> &'static str {
        "report_generator"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let metrics = request
                .payload
                .as_ref()
                .and_then(|p| p.get("metrics"))
                .and_then(|m| m.as_array())
                .cloned()
                .unwrap_or_else(sample_week);
            let t = totals(&metrics);

            let report = json!({
                "business": profile.name,
                "business_type": profile.business_type.label(),
                "period": "last_7_days",
                "totals": {
                    "visitors": t.visitors,
                    "enquiries": t.enquiries,
                    "orders": t.orders,
                    "revenue": t.revenue,
                },
                "growth_score": growth_score(&t),
                "metrics": metrics,
            });

            let mut artifacts: Vec<String> = Vec::new();
            if let Some(writer) = &self.writer {
                let base = format!("{}_weekly_report", profile.name.replace(' ', "_"));

                let json_path = writer.write_json(&base, &report)?;
                artifacts.push(json_path.display().to_string());

                let rows: Vec<Vec<String>> = metrics
                    .iter()
                    .map(|row| {
                        ["day", "visitors", "enquiries", "orders", "revenue"]
                            .iter()
                            .map(|k| {
                                row[*k]
                                    .as_u64()
                                    .map(|v| v.to_string())
                                    .unwrap_or_else(|| row[*k].as_str().unwrap_or("").to_string())
                            })
                            .collect()
                    })
                    .collect();
                let csv_path = writer.write_csv(
                    &base,
                    &["day", "visitors", "enquiries", "orders", "revenue"],
                    &rows,
                )?;
                artifacts.push(csv_path.display().to_string());

                let md = format!(
                    "# Weekly report — {}\n\n- Visitors: {}\n- Enquiries: {}\n- Orders: {}\n- Revenue: {}\n- Growth score: {:.0}\n",
                    profile.name, t.visitors, t.enquiries, t.orders, t.revenue, growth_score(&t),
                );
                let md_path = writer.write_markdown(&base, &md)?;
                artifacts.push(md_path.display().to_string());
            }

            let data = json!({
                "report": report,
                "artifacts": artifacts,
            });
            Ok(AgentReply::success(
                self.name(),
                "Weekly report generated",
                data,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseStatus;

    fn metrics_payload() -> serde_json::Value {
        json!({
            "metrics": [
                {"day": "Mon", "visitors": 200, "enquiries": 20, "orders": 10, "revenue": 5000},
                {"day": "Tue", "visitors": 600, "enquiries": 40, "orders": 20, "revenue": 9000},
            ]
        })
    }

    #[tokio::test]
    async fn collector_produces_a_week_of_rows() {
        let reply = DataCollectorAgent.handle(&AutomationRequest::default()).await.unwrap();
        assert_eq!(reply.status, ResponseStatus::Success);
        let metrics = reply.data["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 7);
        assert_eq!(reply.data["sample_data"], true);
        // Orders never exceed enquiries.
        for row in metrics {
            assert!(row["orders"].as_u64().unwrap() <= row["enquiries"].as_u64().unwrap());
        }
    }

    #[test]
    fn totals_sum_rows() {
        let payload = metrics_payload();
        let rows = payload["metrics"].as_array().unwrap();
        let t = totals(rows);
        assert_eq!(t.visitors, 800);
        assert_eq!(t.enquiries, 60);
        assert_eq!(t.orders, 30);
        assert_eq!(t.revenue, 14000);
    }

    #[test]
    fn growth_score_rewards_healthy_totals() {
        let healthy = WeekTotals {
            visitors: 1000,
            enquiries: 60,
            orders: 30,
            revenue: 20000,
        };
        let weak = WeekTotals::default();
        assert_eq!(growth_score(&healthy), 100.0);
        assert_eq!(growth_score(&weak), 40.0);
    }

    #[test]
    fn recommendations_never_empty() {
        let healthy = WeekTotals {
            visitors: 1000,
            enquiries: 60,
            orders: 30,
            revenue: 20000,
        };
        assert!(!recommendations(&healthy).is_empty());
        assert!(!recommendations(&WeekTotals::default()).is_empty());
    }

    #[tokio::test]
    async fn insights_use_payload_metrics_when_present() {
        let req = AutomationRequest {
            payload: Some(metrics_payload()),
            ..Default::default()
        };
        let reply = InsightsEngineAgent.handle(&req).await.unwrap();
        assert_eq!(reply.data["totals"]["visitors"], 800);
        assert_eq!(reply.data["growth_score"], 100.0);
    }

    #[tokio::test]
    async fn report_writes_artifacts_that_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(ArtifactWriter::new(dir.path()).unwrap());
        let agent = ReportGeneratorAgent::new(Some(writer));

        let req = AutomationRequest {
            business_name: Some("Sharma Dhaba".into()),
            payload: Some(metrics_payload()),
            ..Default::default()
        };
        let reply = agent.handle(&req).await.unwrap();
        let artifacts = reply.data["artifacts"].as_array().unwrap();
        assert_eq!(artifacts.len(), 3);

        // The JSON deliverable parses back.
        let json_path = artifacts
            .iter()
            .map(|a| a.as_str().unwrap())
            .find(|a| a.ends_with(".json"))
            .unwrap();
        let content = std::fs::read_to_string(json_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["business"], "Sharma Dhaba");
    }

    #[tokio::test]
    async fn report_without_writer_is_inline_only() {
        let agent = ReportGeneratorAgent::new(None);
        let reply = agent.handle(&AutomationRequest::default()).await.unwrap();
        assert_eq!(reply.status, ResponseStatus::Success);
        assert!(reply.data["artifacts"].as_array().unwrap().is_empty());
        assert!(reply.data["report"]["totals"]["visitors"].is_u64());
    }
}
