use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{resolve_env, WhatsAppConfig};
use crate::error::Error;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Media kinds supported by the Graph API message endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Document,
    Audio,
    Video,
}

impl MediaKind {
    fn field(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// An incoming message parsed from a webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub from: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub kind: IncomingKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomingKind {
    Text { body: String },
    Button { id: String, title: String },
    Media { media: MediaKind, media_id: String },
}

/// Thin client for the WhatsApp Business (Graph) API. Endpoints and payload
/// shapes are dictated by the vendor documentation.
pub struct WhatsAppClient {
    client: Client,
    access_token: String,
    verify_token: String,
    phone_number_id: String,
    base_url: String,
}

impl WhatsAppClient {
    /// Build from config, resolving tokens from the named env vars.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, Error> {
        let access_token = resolve_env(&config.access_token_env)?;
        let verify_token = resolve_env(&config.verify_token_env).unwrap_or_default();
        Ok(Self::from_credentials(
            &config.phone_number_id,
            access_token,
            verify_token,
            config.api_base.clone(),
        ))
    }

    pub fn from_credentials(
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
        verify_token: impl Into<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            verify_token: verify_token.into(),
            phone_number_id: phone_number_id.into(),
            base_url: api_base.unwrap_or_else(|| GRAPH_API_BASE.to_string()),
        }
    }

    /// Send a plain text message. Returns the provider message id.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, Error> {
        self.send(text_payload(to, body)).await
    }

    /// Send a pre-approved template message with body parameters.
    pub async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        body_params: &[String],
    ) -> Result<String, Error> {
        self.send(template_payload(to, template_name, language, body_params))
            .await
    }

    /// Send an interactive message with up to three reply buttons.
    pub async fn send_interactive(
        &self,
        to: &str,
        body: &str,
        buttons: &[(String, String)],
    ) -> Result<String, Error> {
        if buttons.is_empty() || buttons.len() > 3 {
            return Err(Error::Gateway(format!(
                "interactive messages take 1-3 buttons, got {}",
                buttons.len()
            )));
        }
        self.send(interactive_payload(to, body, buttons)).await
    }

    /// Send a media message by link.
    pub async fn send_media(
        &self,
        to: &str,
        kind: MediaKind,
        link: &str,
        caption: Option<&str>,
    ) -> Result<String, Error> {
        self.send(media_payload(to, kind, link, caption)).await
    }

    async fn send(&self, payload: serde_json::Value) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/{}/messages", self.base_url, self.phone_number_id))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await?;
        body["messages"][0]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Gateway("response missing message id".into()))
    }

    /// Webhook subscription handshake: echo the challenge when the mode and
    /// token match, per the Graph API verification flow.
    pub fn verify_token(&self, mode: &str, token: &str, challenge: &str) -> Option<String> {
        if mode == "subscribe" && !self.verify_token.is_empty() && token == self.verify_token {
            Some(challenge.to_string())
        } else {
            None
        }
    }
}

fn text_payload(to: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body },
    })
}

fn template_payload(
    to: &str,
    template_name: &str,
    language: &str,
    body_params: &[String],
) -> serde_json::Value {
    let components: Vec<serde_json::Value> = if body_params.is_empty() {
        vec![]
    } else {
        vec![serde_json::json!({
            "type": "body",
            "parameters": body_params
                .iter()
                .map(|p| serde_json::json!({"type": "text", "text": p}))
                .collect::<Vec<_>>(),
        })]
    };
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": {
            "name": template_name,
            "language": { "code": language },
            "components": components,
        },
    })
}

fn interactive_payload(to: &str, body: &str, buttons: &[(String, String)]) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": body },
            "action": {
                "buttons": buttons
                    .iter()
                    .map(|(id, title)| serde_json::json!({
                        "type": "reply",
                        "reply": { "id": id, "title": title },
                    }))
                    .collect::<Vec<_>>(),
            },
        },
    })
}

fn media_payload(
    to: &str,
    kind: MediaKind,
    link: &str,
    caption: Option<&str>,
) -> serde_json::Value {
    let mut media = serde_json::json!({ "link": link });
    if let Some(caption) = caption {
        media["caption"] = serde_json::Value::String(caption.to_string());
    }
    let mut payload = serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": kind.field(),
    });
    payload[kind.field()] = media;
    payload
}

/// Parse an incoming webhook payload into messages.
///
/// Walks `entry[].changes[].value.messages[]`, ignoring delivery receipts
/// and other non-message changes.
pub fn parse_webhook(payload: &serde_json::Value) -> Vec<IncomingMessage> {
    let mut messages = Vec::new();

    let Some(entries) = payload["entry"].as_array() else {
        return messages;
    };
    for entry in entries {
        let Some(changes) = entry["changes"].as_array() else {
            continue;
        };
        for change in changes {
            if change["field"].as_str() != Some("messages") {
                continue;
            }
            let Some(raw_messages) = change["value"]["messages"].as_array() else {
                continue;
            };
            for raw in raw_messages {
                if let Some(message) = parse_message(raw) {
                    messages.push(message);
                }
            }
        }
    }
    messages
}

fn parse_message(raw: &serde_json::Value) -> Option<IncomingMessage> {
    let from = raw["from"].as_str()?.to_string();
    let timestamp = raw["timestamp"].as_str().unwrap_or_default().to_string();

    let kind = match raw["type"].as_str()? {
        "text" => IncomingKind::Text {
            body: raw["text"]["body"].as_str().unwrap_or_default().to_string(),
        },
        "interactive" => {
            let reply = &raw["interactive"]["button_reply"];
            IncomingKind::Button {
                id: reply["id"].as_str().unwrap_or_default().to_string(),
                title: reply["title"].as_str().unwrap_or_default().to_string(),
            }
        }
        media @ ("image" | "document" | "audio" | "video") => {
            let kind = match media {
                "image" => MediaKind::Image,
                "document" => MediaKind::Document,
                "audio" => MediaKind::Audio,
                _ => MediaKind::Video,
            };
            IncomingKind::Media {
                media: kind,
                media_id: raw[media]["id"].as_str().unwrap_or_default().to_string(),
            }
        }
        _ => return None,
    };

    Some(IncomingMessage {
        from,
        timestamp,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WhatsAppClient {
        WhatsAppClient::from_credentials("104857600000", "token", "verify_me", None)
    }

    #[test]
    fn text_payload_shape() {
        let payload = text_payload("917234567890", "order ready");
        assert_eq!(payload["messaging_product"], "whatsapp");
        assert_eq!(payload["type"], "text");
        assert_eq!(payload["text"]["body"], "order ready");
    }

    #[test]
    fn template_payload_includes_body_params() {
        let payload = template_payload(
            "917234567890",
            "order_update",
            "hi",
            &["Sharma Dhaba".to_string(), "450".to_string()],
        );
        assert_eq!(payload["template"]["name"], "order_update");
        assert_eq!(payload["template"]["language"]["code"], "hi");
        let params = payload["template"]["components"][0]["parameters"]
            .as_array()
            .unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["text"], "Sharma Dhaba");
    }

    #[test]
    fn template_payload_without_params_has_no_components() {
        let payload = template_payload("917234567890", "hello_world", "en_US", &[]);
        assert!(payload["template"]["components"].as_array().unwrap().is_empty());
    }

    #[test]
    fn interactive_payload_shape() {
        let buttons = vec![
            ("confirm".to_string(), "Confirm".to_string()),
            ("cancel".to_string(), "Cancel".to_string()),
        ];
        let payload = interactive_payload("917234567890", "Confirm your order?", &buttons);
        assert_eq!(payload["interactive"]["type"], "button");
        let rendered = payload["interactive"]["action"]["buttons"].as_array().unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0]["reply"]["id"], "confirm");
    }

    #[tokio::test]
    async fn interactive_rejects_too_many_buttons() {
        let buttons: Vec<(String, String)> = (0..4)
            .map(|i| (format!("b{i}"), format!("Button {i}")))
            .collect();
        let err = client()
            .send_interactive("917234567890", "pick one", &buttons)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1-3 buttons"));
    }

    #[test]
    fn media_payload_with_caption() {
        let payload = media_payload(
            "917234567890",
            MediaKind::Image,
            "https://example.com/menu.jpg",
            Some("Today's menu"),
        );
        assert_eq!(payload["type"], "image");
        assert_eq!(payload["image"]["link"], "https://example.com/menu.jpg");
        assert_eq!(payload["image"]["caption"], "Today's menu");
    }

    #[test]
    fn parse_webhook_extracts_text_message() {
        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "917234567890",
                            "id": "wamid.X",
                            "timestamp": "1717000000",
                            "type": "text",
                            "text": { "body": "is the shop open?" }
                        }]
                    }
                }]
            }]
        });
        let messages = parse_webhook(&payload);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "917234567890");
        assert_eq!(
            messages[0].kind,
            IncomingKind::Text {
                body: "is the shop open?".into()
            }
        );
    }

    #[test]
    fn parse_webhook_extracts_button_reply() {
        let payload = serde_json::json!({
            "entry": [{"changes": [{
                "field": "messages",
                "value": { "messages": [{
                    "from": "917234567890",
                    "timestamp": "1717000001",
                    "type": "interactive",
                    "interactive": {
                        "type": "button_reply",
                        "button_reply": { "id": "confirm", "title": "Confirm" }
                    }
                }]}
            }]}]
        });
        let messages = parse_webhook(&payload);
        assert_eq!(
            messages[0].kind,
            IncomingKind::Button {
                id: "confirm".into(),
                title: "Confirm".into()
            }
        );
    }

    #[test]
    fn parse_webhook_extracts_media() {
        let payload = serde_json::json!({
            "entry": [{"changes": [{
                "field": "messages",
                "value": { "messages": [{
                    "from": "917234567890",
                    "timestamp": "1717000002",
                    "type": "image",
                    "image": { "id": "media_123", "mime_type": "image/jpeg" }
                }]}
            }]}]
        });
        let messages = parse_webhook(&payload);
        assert_eq!(
            messages[0].kind,
            IncomingKind::Media {
                media: MediaKind::Image,
                media_id: "media_123".into()
            }
        );
    }

    #[test]
    fn parse_webhook_ignores_status_only_payloads() {
        let payload = serde_json::json!({
            "entry": [{"changes": [{
                "field": "messages",
                "value": {
                    "statuses": [{ "id": "wamid.X", "status": "delivered" }]
                }
            }]}]
        });
        assert!(parse_webhook(&payload).is_empty());
    }

    #[test]
    fn parse_webhook_ignores_non_message_fields() {
        let payload = serde_json::json!({
            "entry": [{"changes": [{
                "field": "account_update",
                "value": { "messages": [{ "from": "1", "type": "text", "text": {"body": "x"} }] }
            }]}]
        });
        assert!(parse_webhook(&payload).is_empty());
    }

    #[test]
    fn parse_webhook_handles_malformed_payload() {
        assert!(parse_webhook(&serde_json::json!({})).is_empty());
        assert!(parse_webhook(&serde_json::json!({"entry": "not-an-array"})).is_empty());
    }

    #[test]
    fn verify_token_handshake() {
        let client = client();
        assert_eq!(
            client.verify_token("subscribe", "verify_me", "challenge_42"),
            Some("challenge_42".to_string())
        );
        assert_eq!(client.verify_token("subscribe", "wrong", "c"), None);
        assert_eq!(client.verify_token("unsubscribe", "verify_me", "c"), None);
    }

    #[test]
    fn verify_token_disabled_when_unset() {
        let client = WhatsAppClient::from_credentials("1", "t", "", None);
        assert_eq!(client.verify_token("subscribe", "", "c"), None);
    }
}
