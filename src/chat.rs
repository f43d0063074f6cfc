// src/chat.rs

use crate::config::{Config, PersonaField};
use crate::constants::APOLOGY_TEXT;
use crate::errors::AgentError;
use crate::models::{ChatMessage, ChatSession, Role};
use crate::personas::Persona;
use crate::store::{ChatStore, MessageFeed};
use crate::typewriter::Typewriter;
use crate::webhook::{BotBackend, WebhookReply, WebhookRequest};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Identity of a rendered message: a client-side temporary id until the
/// store confirms the row, then the row's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Temp(Uuid),
    Stored(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Resolved,
    Failed,
}

/// A message as shown in the chat view.
#[derive(Debug, Clone)]
pub struct UiMessage {
    pub key: MessageKey,
    pub text: String,
    pub is_user: bool,
    pub delivery: Delivery,
    pub typing: Option<Typewriter>,
    pub timestamp: DateTime<Local>,
}

impl UiMessage {
    fn stored(row: &ChatMessage) -> Self {
        Self {
            key: MessageKey::Stored(row.id.clone()),
            text: row.content.clone(),
            is_user: row.role == Role::User,
            delivery: Delivery::Resolved,
            typing: None,
            timestamp: row.created_at.with_timezone(&Local),
        }
    }

    fn temp(id: Uuid, text: &str, is_user: bool) -> Self {
        Self {
            key: MessageKey::Temp(id),
            text: text.to_string(),
            is_user,
            delivery: Delivery::Pending,
            typing: None,
            timestamp: Local::now(),
        }
    }

    /// Assistant placeholder still waiting for its reply.
    pub fn is_loading(&self) -> bool {
        !self.is_user && self.delivery == Delivery::Pending
    }

    pub fn is_typing(&self) -> bool {
        self.typing.as_ref().is_some_and(|t| !t.is_done())
    }

    pub fn visible_text(&self) -> &str {
        match &self.typing {
            Some(typewriter) => typewriter.visible(&self.text),
            None => &self.text,
        }
    }
}

/// A send that has been rendered optimistically and still needs its reply.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub user_key: Uuid,
    pub reply_key: Uuid,
    pub session_id: Option<String>,
    pub request: WebhookRequest,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// The webhook answered inline.
    Inline(String),
    /// The webhook deferred; this is the store's message list after the delay.
    Reloaded(Vec<ChatMessage>),
    Failed(AgentError),
}

/// State of one open chat with one persona.
pub struct ChatView {
    pub id: Uuid,
    pub persona: &'static Persona,
    pub session: Option<ChatSession>,
    pub user_id: Option<String>,
    pub messages: Vec<UiMessage>,
    pub input: String,
    pub loading_history: bool,
    scroll: u16,
    max_scroll: u16,
    follow_tail: bool,
    feed: Option<MessageFeed>,
    typewriter_step: Option<usize>,
    persona_field: PersonaField,
}

impl ChatView {
    pub fn new(persona: &'static Persona, user_id: Option<String>, config: &Config) -> Self {
        Self {
            id: Uuid::new_v4(),
            persona,
            session: None,
            user_id,
            messages: Vec::new(),
            input: String::new(),
            loading_history: true,
            scroll: 0,
            max_scroll: 0,
            follow_tail: true,
            feed: None,
            typewriter_step: config.typewriter_step(),
            persona_field: config.persona_field,
        }
    }

    /// Replaces the view with the persisted history of `session`.
    pub fn load(&mut self, session: Option<ChatSession>, rows: Vec<ChatMessage>) {
        self.session = session;
        self.messages = rows.iter().map(UiMessage::stored).collect();
        self.loading_history = false;
        self.follow_tail = true;
    }

    pub fn attach_feed(&mut self, feed: MessageFeed) {
        self.feed = Some(feed);
    }

    pub fn detach_feed(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.unsubscribe();
        }
    }

    pub fn has_feed(&self) -> bool {
        self.feed.is_some()
    }

    /// Ids of rows already shown, used to seed a change feed.
    pub fn stored_ids(&self) -> HashSet<String> {
        self.messages
            .iter()
            .filter_map(|m| match &m.key {
                MessageKey::Stored(id) => Some(id.clone()),
                MessageKey::Temp(_) => None,
            })
            .collect()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn show_suggestions(&self) -> bool {
        !self.loading_history && self.messages.is_empty()
    }

    pub fn is_sending(&self) -> bool {
        self.messages.iter().any(UiMessage::is_loading)
    }

    /// Sends whatever is in the input box. Blank input stays where it is.
    pub fn submit_input(&mut self) -> Option<PendingSend> {
        if self.input.trim().is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        self.begin_send(&text)
    }

    /// Appends the user bubble and the assistant placeholder and returns the
    /// request to dispatch. Whitespace-only text sends nothing.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let text = text.trim();
        if text.is_empty() || self.loading_history {
            return None;
        }

        self.finish_typing();

        let user_key = Uuid::new_v4();
        let reply_key = Uuid::new_v4();
        self.messages.push(UiMessage::temp(user_key, text, true));
        self.messages.push(UiMessage::temp(reply_key, "", false));
        self.follow_tail = true;

        let session_id = self.session_id().map(str::to_string);
        let request = WebhookRequest::new(
            self.persona,
            self.persona_field,
            text,
            session_id.clone(),
            self.user_id.clone(),
        );

        Some(PendingSend {
            user_key,
            reply_key,
            session_id,
            request,
        })
    }

    pub fn settle(&mut self, pending: &PendingSend, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Inline(text) => {
                self.set_delivery(&MessageKey::Temp(pending.user_key), Delivery::Resolved);
                self.resolve_placeholder(pending.reply_key, text, Delivery::Resolved);
            }
            SendOutcome::Reloaded(rows) => self.reconcile(pending, rows),
            SendOutcome::Failed(e) => {
                log::error!("Sending to {} failed ({}): {}", self.persona.id, e.kind(), e);
                self.set_delivery(&MessageKey::Temp(pending.user_key), Delivery::Failed);
                self.resolve_placeholder(pending.reply_key, APOLOGY_TEXT.to_string(), Delivery::Failed);
            }
        }
    }

    fn position(&self, key: &MessageKey) -> Option<usize> {
        self.messages.iter().position(|m| &m.key == key)
    }

    fn set_delivery(&mut self, key: &MessageKey, delivery: Delivery) {
        if let Some(idx) = self.position(key) {
            self.messages[idx].delivery = delivery;
        }
    }

    fn resolve_placeholder(&mut self, reply_key: Uuid, text: String, delivery: Delivery) {
        let Some(idx) = self.position(&MessageKey::Temp(reply_key)) else {
            log::debug!("Placeholder {} already settled, dropping late reply", reply_key);
            return;
        };
        if self.messages[idx].delivery != Delivery::Pending {
            log::debug!("Placeholder {} already settled, dropping late reply", reply_key);
            return;
        }

        let message = &mut self.messages[idx];
        message.text = text;
        message.delivery = delivery;
        message.timestamp = Local::now();
        if delivery == Delivery::Resolved {
            self.start_typing(idx);
        }
    }

    /// Swaps the persisted part of the view for `rows`. Bubbles of other sends
    /// still in flight are kept after them.
    fn reconcile(&mut self, pending: &PendingSend, rows: Vec<ChatMessage>) {
        self.finish_typing();

        let own_user = MessageKey::Temp(pending.user_key);
        let own_reply = MessageKey::Temp(pending.reply_key);
        let placeholder = self
            .position(&own_reply)
            .map(|idx| self.messages.remove(idx))
            .filter(|m| m.delivery == Delivery::Pending);
        let own_bubble = self
            .position(&own_user)
            .map(|idx| self.messages.remove(idx));

        let in_flight: Vec<UiMessage> = self
            .messages
            .drain(..)
            .filter(|m| {
                matches!(m.key, MessageKey::Temp(_)) && m.delivery == Delivery::Pending
            })
            .collect();

        let answered = rows.last().is_some_and(|r| r.role == Role::Assistant);
        self.messages = rows.iter().map(UiMessage::stored).collect();

        if answered {
            let last = self.messages.len() - 1;
            self.start_typing(last);
            self.messages.extend(in_flight);
            return;
        }

        let waiting = self.feed.is_some();
        if let Some(mut own) = own_bubble {
            // The sent text stays on screen until the store has a row for it.
            let stored = rows
                .iter()
                .any(|r| r.role == Role::User && r.content == own.text);
            if !stored {
                if !waiting {
                    own.delivery = Delivery::Failed;
                }
                self.messages.push(own);
            }
        }

        if let Some(mut placeholder) = placeholder {
            if waiting {
                log::debug!("No reply stored yet, waiting on change feed");
            } else {
                log::warn!("Store has no reply for {} after reload", self.persona.id);
                placeholder.text = APOLOGY_TEXT.to_string();
                placeholder.delivery = Delivery::Failed;
            }
            self.messages.push(placeholder);
        }

        self.messages.extend(in_flight);
    }

    /// Applies a row pushed by the change feed.
    pub fn apply_feed_row(&mut self, row: ChatMessage) {
        self.finish_typing();

        let key = MessageKey::Stored(row.id.clone());
        if let Some(idx) = self.position(&key) {
            self.messages[idx].text = row.content;
            return;
        }

        let matching = match row.role {
            Role::Assistant => self.messages.iter().position(UiMessage::is_loading),
            Role::User => self.messages.iter().position(|m| {
                m.is_user && matches!(m.key, MessageKey::Temp(_)) && m.text == row.content
            }),
            Role::System => None,
        };

        match matching {
            Some(idx) => {
                let message = &mut self.messages[idx];
                message.key = key;
                message.text = row.content;
                let was_pending = message.delivery == Delivery::Pending;
                message.delivery = Delivery::Resolved;
                if was_pending && !message.is_user {
                    self.start_typing(idx);
                }
            }
            None => {
                let message = UiMessage::stored(&row);
                self.messages.push(message);
                if row.role == Role::Assistant {
                    let last = self.messages.len() - 1;
                    self.start_typing(last);
                }
            }
        }
    }

    /// Applies everything the change feed delivered since the last call.
    pub fn drain_feed(&mut self) {
        let rows = match self.feed.as_mut() {
            Some(feed) => feed.drain(),
            None => return,
        };
        for row in rows {
            self.apply_feed_row(row);
        }
    }

    fn start_typing(&mut self, idx: usize) {
        self.finish_typing();
        if let Some(step) = self.typewriter_step {
            let message = &mut self.messages[idx];
            message.typing = Some(Typewriter::new(&message.text, step));
        }
    }

    /// Ends any running reveal, showing the full text.
    pub fn finish_typing(&mut self) {
        for message in &mut self.messages {
            message.typing = None;
        }
    }

    /// Advances the running reveal by one step.
    pub fn tick(&mut self) {
        for message in &mut self.messages {
            if let Some(typewriter) = message.typing.as_mut() {
                if !typewriter.tick() {
                    message.typing = None;
                }
            }
        }
    }

    pub fn scroll_up(&mut self) {
        if self.follow_tail {
            self.follow_tail = false;
            self.scroll = self.max_scroll;
        }
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
        if self.scroll >= self.max_scroll {
            self.follow_tail = true;
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow_tail
    }

    /// Scroll offset for a viewport of `height` lines over `total_lines`.
    pub fn viewport_scroll(&mut self, total_lines: u16, height: u16) -> u16 {
        self.max_scroll = total_lines.saturating_sub(height);
        self.scroll = if self.follow_tail {
            self.max_scroll
        } else {
            self.scroll.min(self.max_scroll)
        };
        self.scroll
    }
}

/// Dispatches a pending send and waits for its reply.
///
/// Never returns an error: every failure ends as `SendOutcome::Failed`.
pub async fn run_exchange(
    bot: &dyn BotBackend,
    store: &dyn ChatStore,
    pending: &PendingSend,
    reload_delay: Duration,
) -> SendOutcome {
    let touch = async {
        if let Some(session_id) = &pending.session_id {
            if let Err(e) = store.touch_session(session_id).await {
                log::warn!("Failed to bump session {} ({}): {}", session_id, e.kind(), e);
            }
        }
    };
    let (reply, ()) = tokio::join!(bot.send(&pending.request), touch);

    match reply {
        Ok(WebhookReply::Inline(text)) => SendOutcome::Inline(text),
        Ok(WebhookReply::Deferred) => {
            let Some(session_id) = &pending.session_id else {
                return SendOutcome::Failed(AgentError::store_error(
                    "Reply was deferred but the chat has no session",
                ));
            };
            log::debug!("Reply deferred, reloading {} in {:?}", session_id, reload_delay);
            tokio::time::sleep(reload_delay).await;
            match store.list_messages(session_id).await {
                Ok(rows) => SendOutcome::Reloaded(rows),
                Err(e) => SendOutcome::Failed(e),
            }
        }
        Err(e) => SendOutcome::Failed(e),
    }
}
