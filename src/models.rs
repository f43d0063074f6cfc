// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Author of a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A user as returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Session snapshot pushed by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

/// The persistent grouping of messages between one user and one persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub user_id: String,
    pub persona_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the `chat_messages_view` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub persona_id: Option<String>,
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Logs details of each API call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCallLog {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub request_summary: String,
    pub response_status: u16,
    pub response_time_ms: u128,
}

// n8n writes integer ids, the sessions table uses uuids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_message_accepts_numeric_ids() {
        let row: ChatMessage = serde_json::from_value(json!({
            "id": 42,
            "chat_id": "c0ffee",
            "user_id": null,
            "persona_id": "top-manager",
            "content": "Добрий день",
            "role": "assistant",
            "created_at": "2025-03-01T10:00:00.123456+00:00"
        }))
        .unwrap();

        assert_eq!(row.id, "42");
        assert_eq!(row.chat_id, "c0ffee");
        assert_eq!(row.user_id, None);
        assert_eq!(row.role, Role::Assistant);
    }

    #[test]
    fn chat_message_rejects_unknown_role() {
        let result = serde_json::from_value::<ChatMessage>(json!({
            "id": "1",
            "chat_id": "1",
            "content": "x",
            "role": "bot",
            "created_at": "2025-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
