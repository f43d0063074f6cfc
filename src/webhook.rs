// src/webhook.rs

use crate::config::{Config, PersonaField};
use crate::errors::{AgentError, AgentResult};
use crate::logging::record_api_call;
use crate::personas::{webhook_code, Persona};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Body posted to the bot workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub persona: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl WebhookRequest {
    pub fn new(
        persona: &Persona,
        field: PersonaField,
        message: &str,
        session_id: Option<String>,
        user_id: Option<String>,
    ) -> Self {
        let persona = match field {
            PersonaField::Code => webhook_code(persona.id).to_string(),
            PersonaField::Name => persona.name.to_string(),
        };

        Self {
            persona,
            message: message.to_string(),
            session_id,
            user_id,
        }
    }
}

/// How the workflow answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookReply {
    /// The reply text came back inline.
    Inline(String),
    /// No usable text; the workflow writes the reply into the store itself.
    Deferred,
}

/// Reads a webhook body. Only `[{"output": "<text>", ...}, ...]` counts as an
/// inline answer; every other shape is deferred to the store.
pub fn interpret_reply(body: &Value) -> WebhookReply {
    body.as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("output"))
        .and_then(Value::as_str)
        .map(|output| WebhookReply::Inline(output.to_string()))
        .unwrap_or(WebhookReply::Deferred)
}

/// Whatever performs bot inference for a message.
#[async_trait]
pub trait BotBackend: Send + Sync {
    async fn send(&self, request: &WebhookRequest) -> AgentResult<WebhookReply>;
}

/// HTTP client for the n8n webhook.
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(config: &Config) -> AgentResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl BotBackend for WebhookClient {
    async fn send(&self, request: &WebhookRequest) -> AgentResult<WebhookReply> {
        let started = Instant::now();
        let summary = format!("webhook send ({})", request.persona);

        let response = match self.client.post(&self.url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                record_api_call(&self.url, &summary, 0, started);
                return Err(e.into());
            }
        };

        let status = response.status();
        record_api_call(&self.url, &summary, status.as_u16(), started);
        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| {
            log::debug!("Webhook returned a non-JSON body: {}", text);
            Value::Null
        });

        Ok(interpret_reply(&body))
    }
}
