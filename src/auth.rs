// src/auth.rs

use crate::config::Config;
use crate::errors::{AgentError, AgentResult};
use crate::logging::record_api_call;
use crate::models::{AuthSession, AuthUser};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Hosted authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Signs in with email and password. A rejected login yields
    /// `AgentError::Auth` carrying the provider's message.
    async fn sign_in(&self, email: &str, password: &str) -> AgentResult<AuthUser>;

    async fn sign_out(&self) -> AgentResult<()>;

    async fn get_session(&self) -> AgentResult<Option<AuthSession>>;

    /// Session snapshots, pushed whenever the provider's session changes.
    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>>;
}

/// Supabase GoTrue over its REST API.
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    session_tx: watch::Sender<Option<AuthSession>>,
}

impl SupabaseAuth {
    pub fn new(config: &Config) -> AgentResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        let (session_tx, _) = watch::channel(None);

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            session_tx,
        })
    }
}

/// Pulls the human readable message out of a GoTrue error body.
fn provider_message(body: &Value, fallback: &str) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body[*key].as_str())
        .unwrap_or(fallback)
        .to_string()
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> AgentResult<AuthUser> {
        let endpoint = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let started = Instant::now();

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                record_api_call(&endpoint, "sign in", 0, started);
                AgentError::from(e)
            })?;

        let status = response.status();
        record_api_call(&endpoint, "sign in", status.as_u16(), started);

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let message = provider_message(&body, status.canonical_reason().unwrap_or("Sign in failed"));
            log::warn!("Sign in rejected for {}: {}", email, message);
            return Err(AgentError::auth_error(message));
        }

        let session: AuthSession = serde_json::from_value(body)?;
        let user = session.user.clone();
        self.session_tx.send_replace(Some(session));
        log::info!("Signed in as {}", user.email);

        Ok(user)
    }

    async fn sign_out(&self) -> AgentResult<()> {
        let previous = self.session_tx.send_replace(None);
        let Some(session) = previous else {
            return Ok(());
        };

        let endpoint = format!("{}/auth/v1/logout", self.base_url);
        let started = Instant::now();
        let result = self
            .client
            .post(&endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                record_api_call(&endpoint, "sign out", status.as_u16(), started);
                if status.is_success() {
                    Ok(())
                } else {
                    Err(AgentError::Http {
                        status: status.as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    })
                }
            }
            Err(e) => {
                record_api_call(&endpoint, "sign out", 0, started);
                Err(e.into())
            }
        }
    }

    async fn get_session(&self) -> AgentResult<Option<AuthSession>> {
        Ok(self.session_tx.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session_tx.subscribe()
    }
}

/// What the rest of the app knows about the signed in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
    pub loading: bool,
}

impl AuthState {
    fn from_session(session: Option<AuthSession>) -> Self {
        Self {
            user: session.as_ref().map(|s| s.user.clone()),
            session,
            loading: false,
        }
    }
}

/// Session and user state owned by the application root.
///
/// Created once on boot from the provider's current session, kept current by
/// a listener on the provider's change events, and torn down by
/// [`AuthContext::shutdown`] (or on drop).
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    state_tx: watch::Sender<AuthState>,
    listener: AbortHandle,
}

impl AuthContext {
    pub async fn init(provider: Arc<dyn AuthProvider>) -> Self {
        let (state_tx, _) = watch::channel(AuthState {
            loading: true,
            ..AuthState::default()
        });

        match provider.get_session().await {
            Ok(session) => {
                state_tx.send_replace(AuthState::from_session(session));
            }
            Err(e) => {
                log::error!("Error getting session: {}", e);
                state_tx.send_modify(|state| state.loading = false);
            }
        }

        let mut changes = provider.subscribe();
        let listener_tx = state_tx.clone();
        let listener = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let session = changes.borrow_and_update().clone();
                log::debug!("Auth state changed, signed in: {}", session.is_some());
                listener_tx.send_replace(AuthState::from_session(session));
            }
        })
        .abort_handle();

        Self {
            provider,
            state_tx,
            listener,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state_tx.borrow().user.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AgentResult<AuthUser> {
        let user = self.provider.sign_in(email, password).await?;
        let session = self.provider.get_session().await.ok().flatten();
        self.state_tx.send_replace(AuthState {
            user: Some(user.clone()),
            session,
            loading: false,
        });
        Ok(user)
    }

    pub async fn sign_out(&self) -> AgentResult<()> {
        let result = self.provider.sign_out().await;
        self.state_tx.send_replace(AuthState::default());
        result
    }

    pub fn shutdown(&self) {
        self.listener.abort();
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeAuth;
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn config_for(server: &MockServer) -> Config {
        Config {
            supabase_url: server.uri(),
            supabase_anon_key: "anon-key".to_string(),
            ..Config::default()
        }
    }

    fn session_body() -> Value {
        json!({
            "access_token": "jwt-token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "8d0f6c1e",
                "email": "analyst@pivdenny.com",
                "created_at": "2025-01-10T08:00:00Z"
            }
        })
    }

    #[tokio::test]
    async fn sign_in_success_publishes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({
                "email": "analyst@pivdenny.com",
                "password": "secret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(&config_for(&server)).unwrap();
        let mut changes = auth.subscribe();

        let user = auth.sign_in("analyst@pivdenny.com", "secret").await.unwrap();

        assert_eq!(user.id, "8d0f6c1e");
        assert!(changes.has_changed().unwrap());
        let session = changes.borrow_and_update().clone().unwrap();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(auth.get_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn sign_in_failure_surfaces_provider_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(&config_for(&server)).unwrap();
        let err = auth.sign_in("analyst@pivdenny.com", "wrong").await.unwrap_err();

        assert!(matches!(err, AgentError::Auth(ref m) if m == "Invalid login credentials"));
        assert_eq!(auth.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_calls_logout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer jwt-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(&config_for(&server)).unwrap();
        auth.sign_in("analyst@pivdenny.com", "secret").await.unwrap();
        auth.sign_out().await.unwrap();

        assert_eq!(auth.get_session().await.unwrap(), None);
    }

    #[test]
    fn provider_message_prefers_description() {
        let body = json!({ "msg": "Email not confirmed", "error": "x" });
        assert_eq!(provider_message(&body, "fallback"), "Email not confirmed");
        assert_eq!(provider_message(&Value::Null, "fallback"), "fallback");
    }

    #[tokio::test]
    async fn context_tracks_provider_pushed_changes() {
        let provider = Arc::new(FakeAuth::new("analyst@pivdenny.com", "secret"));
        let context = AuthContext::init(provider.clone()).await;

        assert_eq!(context.state().loading, false);
        assert!(context.current_user().is_none());

        let mut states = context.subscribe();
        provider
            .session_tx
            .send_replace(Some(FakeAuth::session_for("analyst@pivdenny.com")));

        tokio::time::timeout(Duration::from_secs(1), states.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            context.current_user().map(|u| u.email),
            Some("analyst@pivdenny.com".to_string())
        );
    }

    #[tokio::test]
    async fn context_sign_in_and_out_update_state_immediately() {
        let provider = Arc::new(FakeAuth::new("analyst@pivdenny.com", "secret"));
        let context = AuthContext::init(provider).await;

        let err = context.sign_in("analyst@pivdenny.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(context.current_user().is_none());

        context.sign_in("analyst@pivdenny.com", "secret").await.unwrap();
        assert!(context.current_user().is_some());
        assert!(context.state().session.is_some());

        context.sign_out().await.unwrap();
        assert!(context.current_user().is_none());
    }

    #[tokio::test]
    async fn context_shutdown_stops_listener() {
        let provider = Arc::new(FakeAuth::new("a@b.co", "pw"));
        let context = AuthContext::init(provider.clone()).await;
        context.shutdown();
        tokio::task::yield_now().await;

        provider
            .session_tx
            .send_replace(Some(FakeAuth::session_for("a@b.co")));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(context.current_user().is_none());
    }
}
