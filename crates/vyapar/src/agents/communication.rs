use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use crate::agent::Agent;
use crate::error::Error;
use crate::request::{AgentReply, AutomationRequest};
use crate::template::{content_for, render};

/// Customer intent inferred from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Greeting,
    Enquiry,
}

const GREETING_KEYWORDS: &[&str] = &["hello", "hi ", "namaste", "hey", "नमस्ते"];

fn detect_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if GREETING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Intent::Greeting
    } else {
        Intent::Enquiry
    }
}

/// Default route target: answers general queries with the canned reply for
/// the detected intent and business type.
pub struct CustomerCommunicationAgent;

impl Agent for CustomerCommunicationAgent {
    fn name(&self) -> &'static str {
        "customer_communication"
    }

    fn handle<'a>(
        &'a self,
        request: &'a AutomationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentReply, Error>> + Send + 'a>> {
        Box::pin(async move {
            let profile = request.profile();
            let vars = profile.template_vars();
            let content = content_for(profile.business_type);

            let template = match detect_intent(&request.description) {
                Intent::Greeting => content.greeting_reply,
                Intent::Enquiry => content.enquiry_reply,
            };

            let data = json!({
                "reply": render(template, &vars),
                "channel": "whatsapp",
                "language": profile.market.language,
            });
            Ok(AgentReply::success(
                self.name(),
                "Customer reply prepared",
                data,
            ))
        })
    }
}
