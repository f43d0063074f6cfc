// src/store.rs

use crate::config::Config;
use crate::constants::{MESSAGES_VIEW, SESSIONS_TABLE};
use crate::errors::{AgentError, AgentResult};
use crate::logging::record_api_call;
use crate::models::{AuthSession, ChatMessage, ChatSession};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;

/// Hosted persistence for chat sessions and messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_session(&self, user_id: &str, persona_id: &str) -> AgentResult<ChatSession>;

    /// Sessions of a user, most recently updated first.
    async fn list_sessions(&self, user_id: &str) -> AgentResult<Vec<ChatSession>>;

    /// Messages of a session, oldest first.
    async fn list_messages(&self, session_id: &str) -> AgentResult<Vec<ChatMessage>>;

    /// Bumps `updated_at` of a session to now.
    async fn touch_session(&self, session_id: &str) -> AgentResult<()>;
}

/// Returns the most recently updated session of `user_id` with `persona_id`,
/// creating one when none exists.
pub async fn get_or_create_session(
    store: &dyn ChatStore,
    user_id: &str,
    persona_id: &str,
) -> AgentResult<ChatSession> {
    let sessions = store.list_sessions(user_id).await?;
    if let Some(existing) = sessions.into_iter().find(|s| s.persona_id == persona_id) {
        log::debug!("Reusing chat session {} for {}", existing.id, persona_id);
        return Ok(existing);
    }

    let created = store.create_session(user_id, persona_id).await?;
    log::info!("Created chat session {} for {}", created.id, persona_id);
    Ok(created)
}

/// Supabase PostgREST client. Requests carry the signed in user's token
/// when there is one, the anon key otherwise.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
    session: watch::Receiver<Option<AuthSession>>,
}

impl SupabaseStore {
    pub fn new(config: &Config, session: watch::Receiver<Option<AuthSession>>) -> AgentResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", config.supabase_url.trim_end_matches('/')),
            anon_key: config.supabase_anon_key.clone(),
            session,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());

        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    async fn execute(&self, request: RequestBuilder, endpoint: &str, summary: &str) -> AgentResult<Response> {
        let started = Instant::now();
        let response = match self.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                record_api_call(endpoint, summary, 0, started);
                return Err(e.into());
            }
        };

        let status = response.status();
        record_api_call(endpoint, summary, status.as_u16(), started);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str, summary: &str) -> AgentResult<T> {
        let response = self.execute(request, endpoint, summary).await?;
        response
            .json()
            .await
            .map_err(|e| AgentError::decode_error(format!("{}: {}", summary, e)))
    }
}

#[async_trait]
impl ChatStore for SupabaseStore {
    async fn create_session(&self, user_id: &str, persona_id: &str) -> AgentResult<ChatSession> {
        let endpoint = format!("{}/{}", self.base_url, SESSIONS_TABLE);
        let request = self
            .client
            .post(&endpoint)
            .header("Prefer", "return=representation")
            .json(&json!([{ "user_id": user_id, "persona_id": persona_id }]));

        let rows: Vec<ChatSession> = self.fetch(request, &endpoint, "create session").await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AgentError::store_error("Insert returned no session row"))
    }

    async fn list_sessions(&self, user_id: &str) -> AgentResult<Vec<ChatSession>> {
        let endpoint = format!("{}/{}", self.base_url, SESSIONS_TABLE);
        let request = self.client.get(&endpoint).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "updated_at.desc".to_string()),
        ]);

        self.fetch(request, &endpoint, "list sessions").await
    }

    async fn list_messages(&self, session_id: &str) -> AgentResult<Vec<ChatMessage>> {
        let endpoint = format!("{}/{}", self.base_url, MESSAGES_VIEW);
        let request = self.client.get(&endpoint).query(&[
            ("select", "*".to_string()),
            ("chat_id", format!("eq.{}", session_id)),
            ("order", "created_at.asc".to_string()),
        ]);

        self.fetch(request, &endpoint, "list messages").await
    }

    async fn touch_session(&self, session_id: &str) -> AgentResult<()> {
        let endpoint = format!("{}/{}", self.base_url, SESSIONS_TABLE);
        let request = self
            .client
            .patch(&endpoint)
            .query(&[("id", format!("eq.{}", session_id))])
            .json(&json!({ "updated_at": Utc::now().to_rfc3339() }));

        self.execute(request, &endpoint, "touch session").await?;
        Ok(())
    }
}

/// Live subscription to new message rows of one session.
///
/// Rows are discovered by polling the store; the polling task is aborted when
/// the feed is dropped, so the owning view releases it by going away.
pub struct MessageFeed {
    rows: mpsc::UnboundedReceiver<ChatMessage>,
    task: AbortHandle,
}

impl MessageFeed {
    /// Rows received since the last call, in arrival order.
    pub fn drain(&mut self) -> Vec<ChatMessage> {
        let mut rows = Vec::new();
        while let Ok(row) = self.rows.try_recv() {
            rows.push(row);
        }
        rows
    }

    pub async fn next(&mut self) -> Option<ChatMessage> {
        self.rows.recv().await
    }

    pub fn unsubscribe(&self) {
        self.task.abort();
    }
}

impl Drop for MessageFeed {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub fn subscribe_messages(
    store: Arc<dyn ChatStore>,
    session_id: String,
    mut seen: HashSet<String>,
    interval: Duration,
) -> MessageFeed {
    let (tx, rows) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let fetched = match store.list_messages(&session_id).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    log::warn!("Change feed poll for {} failed ({}): {}", session_id, e.kind(), e);
                    continue;
                }
            };

            for row in fetched {
                if seen.insert(row.id.clone()) && tx.send(row).is_err() {
                    return;
                }
            }
            if tx.is_closed() {
                return;
            }
        }
    })
    .abort_handle();

    log::debug!("Subscribed to message feed");
    MessageFeed { rows, task }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::models::Role;
    use chrono::{DateTime, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap()
    }

    pub fn row(id: &str, chat_id: &str, role: Role, content: &str, minute: u32) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            user_id: Some("user-1".to_string()),
            persona_id: Some("top-manager".to_string()),
            content: content.to_string(),
            role,
            created_at: at(minute),
        }
    }

    /// In-memory store. `fail_messages` makes every message fetch fail.
    #[derive(Default)]
    pub struct FakeStore {
        pub sessions: Mutex<Vec<ChatSession>>,
        pub messages: Mutex<Vec<ChatMessage>>,
        pub list_message_calls: AtomicUsize,
        pub touch_calls: AtomicUsize,
        pub fail_messages: bool,
    }

    impl FakeStore {
        pub fn with_messages(rows: Vec<ChatMessage>) -> Self {
            Self {
                messages: Mutex::new(rows),
                ..Self::default()
            }
        }

        pub fn push(&self, row: ChatMessage) {
            self.messages.lock().unwrap().push(row);
        }

        pub fn message_fetches(&self) -> usize {
            self.list_message_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatStore for FakeStore {
        async fn create_session(&self, user_id: &str, persona_id: &str) -> AgentResult<ChatSession> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = ChatSession {
                id: format!("chat-{}", sessions.len() + 1),
                user_id: user_id.to_string(),
                persona_id: persona_id.to_string(),
                created_at: at(0),
                updated_at: at(0),
            };
            sessions.push(session.clone());
            Ok(session)
        }

        async fn list_sessions(&self, user_id: &str) -> AgentResult<Vec<ChatSession>> {
            let mut sessions: Vec<_> = self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        }

        async fn list_messages(&self, session_id: &str) -> AgentResult<Vec<ChatMessage>> {
            self.list_message_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_messages {
                return Err(AgentError::Transport("connection refused".to_string()));
            }
            let mut rows: Vec<_> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.chat_id == session_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(rows)
        }

        async fn touch_session(&self, _session_id: &str) -> AgentResult<()> {
            self.touch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{at, row, FakeStore};
    use super::*;
    use crate::models::Role;
    use serde_json::Value;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn store_for(server: &MockServer) -> SupabaseStore {
        let config = Config {
            supabase_url: server.uri(),
            supabase_anon_key: "anon-key".to_string(),
            ..Config::default()
        };
        let (_, session) = watch::channel(None);
        SupabaseStore::new(&config, session).unwrap()
    }

    fn session_json(id: &str, persona: &str, updated: &str) -> Value {
        json!({
            "id": id,
            "user_id": "user-1",
            "persona_id": persona,
            "created_at": "2025-03-01T09:00:00+00:00",
            "updated_at": updated
        })
    }

    #[tokio::test]
    async fn list_messages_filters_by_chat_and_orders_by_creation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/chat_messages_view"))
            .and(query_param("chat_id", "eq.chat-9"))
            .and(query_param("order", "created_at.asc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1, "chat_id": "chat-9", "user_id": "user-1", "persona_id": "top-manager",
                    "content": "Привіт", "role": "user", "created_at": "2025-03-01T10:00:00+00:00"
                },
                {
                    "id": 2, "chat_id": "chat-9", "user_id": "user-1", "persona_id": "top-manager",
                    "content": "Добрий день!", "role": "assistant", "created_at": "2025-03-01T10:00:03+00:00"
                }
            ])))
            .mount(&server)
            .await;

        let rows = store_for(&server).list_messages("chat-9").await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, Role::User);
        assert_eq!(rows[1].content, "Добрий день!");
    }

    #[tokio::test]
    async fn create_session_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/chat_sessions"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([{ "user_id": "user-1", "persona_id": "digital-nomad" }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                session_json("5b1d", "digital-nomad", "2025-03-01T09:00:00+00:00")
            ])))
            .mount(&server)
            .await;

        let session = store_for(&server)
            .create_session("user-1", "digital-nomad")
            .await
            .unwrap();
        assert_eq!(session.id, "5b1d");
        assert_eq!(session.persona_id, "digital-nomad");
    }

    #[tokio::test]
    async fn server_errors_become_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/chat_sessions"))
            .and(query_param("id", "eq.chat-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
            .mount(&server)
            .await;

        let err = store_for(&server).touch_session("chat-1").await.unwrap_err();
        assert!(matches!(err, AgentError::Http { status: 401, ref body } if body == "JWT expired"));
    }

    #[tokio::test]
    async fn get_or_create_reuses_matching_session() {
        let store = FakeStore::default();
        let first = get_or_create_session(&store, "user-1", "top-manager").await.unwrap();
        let again = get_or_create_session(&store, "user-1", "top-manager").await.unwrap();
        let other = get_or_create_session(&store, "user-1", "digital-nomad").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
        assert_eq!(store.sessions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn feed_delivers_only_unseen_rows_and_stops_on_drop() {
        let store = Arc::new(FakeStore::with_messages(vec![row(
            "1",
            "chat-1",
            Role::User,
            "Привіт",
            0,
        )]));
        let seen = HashSet::from(["1".to_string()]);
        let mut feed = subscribe_messages(
            store.clone(),
            "chat-1".to_string(),
            seen,
            Duration::from_millis(10),
        );

        store.push(row("2", "chat-1", Role::Assistant, "Вітаю", 1));
        let delivered = tokio::time::timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.id, "2");
        assert_eq!(delivered.created_at, at(1));

        drop(feed);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let polls = store.message_fetches();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.message_fetches(), polls);
    }
}
