// src/app.rs

use crate::auth::{AuthContext, AuthState};
use crate::chat::{run_exchange, ChatView, PendingSend};
use crate::config::Config;
use crate::login::LoginForm;
use crate::personas::{self, find_persona, Persona};
use crate::status_indicator::StatusIndicator;
use crate::store::{get_or_create_session, subscribe_messages, ChatStore};
use crate::webhook::BotBackend;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Personas are laid out in a grid this many cards wide.
pub const GRID_COLUMNS: usize = 2;

/// The active route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppScreen {
    Login,
    Personas,
    Chat { persona_id: String },
}

/// Long-lived collaborators shared by every task.
pub struct Services {
    pub auth: AuthContext,
    pub store: Arc<dyn ChatStore>,
    pub bot: Arc<dyn BotBackend>,
    pub config: Config,
}

pub struct App {
    pub screen: AppScreen,
    pub login: LoginForm,
    pub selected_persona: usize,
    pub chat: Option<ChatView>,
    pub status_indicator: StatusIndicator,
    pub quit_confirm: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(signed_in: bool) -> App {
        App {
            screen: if signed_in {
                AppScreen::Personas
            } else {
                AppScreen::Login
            },
            login: LoginForm::default(),
            selected_persona: 0,
            chat: None,
            status_indicator: StatusIndicator::new(),
            quit_confirm: false,
            should_quit: false,
        }
    }

    pub fn show_login(&mut self) {
        self.chat = None;
        self.login = LoginForm::default();
        self.status_indicator.clear_status();
        self.screen = AppScreen::Login;
    }

    /// Leaves any open chat. Dropping the view releases its change feed.
    pub fn show_personas(&mut self) {
        self.chat = None;
        self.status_indicator.clear_status();
        self.status_indicator.set_thinking(false);
        self.screen = AppScreen::Personas;
    }

    pub fn selected(&self) -> &'static Persona {
        let all = personas::all();
        &all[self.selected_persona.min(all.len() - 1)]
    }

    pub fn select_left(&mut self) {
        if self.selected_persona % GRID_COLUMNS > 0 {
            self.selected_persona -= 1;
        }
    }

    pub fn select_right(&mut self) {
        if self.selected_persona % GRID_COLUMNS + 1 < GRID_COLUMNS
            && self.selected_persona + 1 < personas::all().len()
        {
            self.selected_persona += 1;
        }
    }

    pub fn select_up(&mut self) {
        if self.selected_persona >= GRID_COLUMNS {
            self.selected_persona -= GRID_COLUMNS;
        }
    }

    pub fn select_down(&mut self) {
        if self.selected_persona + GRID_COLUMNS < personas::all().len() {
            self.selected_persona += GRID_COLUMNS;
        }
    }

    /// Opens the chat route for `persona_id`. Unknown ids route back to the
    /// persona grid. Returns the id of the new view.
    pub fn enter_chat(
        &mut self,
        persona_id: &str,
        user_id: Option<String>,
        config: &Config,
    ) -> Option<Uuid> {
        let Some(persona) = find_persona(persona_id) else {
            log::warn!("Unknown persona {}, back to persona list", persona_id);
            self.show_personas();
            return None;
        };

        let view = ChatView::new(persona, user_id, config);
        let view_id = view.id;
        self.chat = Some(view);
        self.status_indicator.set_status("Завантаження історії...");
        self.screen = AppScreen::Chat {
            persona_id: persona.id.to_string(),
        };
        Some(view_id)
    }

    /// The open chat view, if it is still the one identified by `view_id`.
    pub fn chat_view(&mut self, view_id: Uuid) -> Option<&mut ChatView> {
        self.chat.as_mut().filter(|view| view.id == view_id)
    }

    /// Routes to login when the session disappears outside of this client,
    /// e.g. an expired token reported by the provider.
    pub fn apply_auth(&mut self, state: &AuthState) {
        if !state.loading && state.user.is_none() && self.screen != AppScreen::Login {
            log::info!("Signed out, back to login");
            self.show_login();
        }
    }

    pub fn on_tick(&mut self) {
        self.status_indicator.update_spinner();
        if let Some(view) = self.chat.as_mut() {
            view.drain_feed();
            view.tick();
            self.status_indicator.set_thinking(view.is_sending());
        }
    }
}

/// Runs a sign-in submitted from the login form.
pub async fn complete_login(
    app: Arc<Mutex<App>>,
    services: Arc<Services>,
    email: String,
    password: String,
) {
    let result = services.auth.sign_in(&email, &password).await;

    let mut guard = app.lock().await;
    match &result {
        Ok(user) => log::info!("Signed in as {}", user.email),
        Err(e) => log::warn!("Sign in failed ({}): {}", e.kind(), e),
    }
    if guard.login.finish_submit(&result) && guard.screen == AppScreen::Login {
        guard.show_personas();
    }
}

/// Loads the session and history of a freshly opened chat view.
/// Fetch failures are logged and leave the view empty.
pub async fn mount_chat(app: Arc<Mutex<App>>, services: Arc<Services>, view_id: Uuid) {
    let (persona_id, user_id) = {
        let mut guard = app.lock().await;
        match guard.chat_view(view_id) {
            Some(view) => (view.persona.id, view.user_id.clone()),
            None => return,
        }
    };

    let session = match user_id {
        Some(user_id) => {
            match get_or_create_session(services.store.as_ref(), &user_id, persona_id).await {
                Ok(session) => Some(session),
                Err(e) => {
                    log::error!("Failed to get chat session for {} ({}): {}", persona_id, e.kind(), e);
                    None
                }
            }
        }
        None => {
            log::warn!("Opening {} without a signed in user", persona_id);
            None
        }
    };

    let rows = match &session {
        Some(session) => match services.store.list_messages(&session.id).await {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to load messages for {} ({}): {}", session.id, e.kind(), e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let mut guard = app.lock().await;
    let Some(view) = guard.chat_view(view_id) else {
        log::debug!("Chat {} closed before its history arrived", view_id);
        return;
    };

    log::info!("Loaded {} messages for {}", rows.len(), persona_id);
    view.load(session, rows);

    if services.config.realtime_enabled {
        if let Some(session_id) = view.session_id().map(str::to_string) {
            let feed = subscribe_messages(
                services.store.clone(),
                session_id,
                view.stored_ids(),
                services.config.realtime_poll_interval(),
            );
            view.attach_feed(feed);
        }
    }
    guard.status_indicator.clear_status();
}

/// Waits for the reply to `pending` and applies it to the view it was sent from.
pub async fn complete_send(
    app: Arc<Mutex<App>>,
    services: Arc<Services>,
    view_id: Uuid,
    pending: PendingSend,
) {
    let outcome = run_exchange(
        services.bot.as_ref(),
        services.store.as_ref(),
        &pending,
        services.config.reload_delay(),
    )
    .await;

    let mut guard = app.lock().await;
    match guard.chat_view(view_id) {
        Some(view) => view.settle(&pending, outcome),
        None => log::debug!("Chat {} closed, dropping reply", view_id),
    }
}

pub fn spawn_send(app: &Arc<Mutex<App>>, services: &Arc<Services>, view_id: Uuid, pending: PendingSend) {
    tokio::spawn(complete_send(app.clone(), services.clone(), view_id, pending));
}

/// Signs out and routes to login whatever the provider answers.
pub async fn sign_out(app: Arc<Mutex<App>>, services: Arc<Services>) {
    if let Err(e) = services.auth.sign_out().await {
        log::error!("Sign out failed ({}): {}", e.kind(), e);
    }
    app.lock().await.show_login();
}
