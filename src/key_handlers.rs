use crate::app::{complete_login, mount_chat, sign_out, spawn_send, App, AppScreen, Services};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Dispatches a key press. Network work is spawned; the handler itself never waits.
pub fn handle_key(key: KeyEvent, app: &mut App, app_arc: &Arc<Mutex<App>>, services: &Arc<Services>) {
    if app.quit_confirm {
        handle_quit_confirm_input(key, app);
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit_confirm = true;
        return;
    }

    match app.screen {
        AppScreen::Login => handle_login_input(key, app, app_arc, services),
        AppScreen::Personas => handle_personas_input(key, app, app_arc, services),
        AppScreen::Chat { .. } => handle_chat_input(key, app, app_arc, services),
    }
}

fn handle_login_input(key: KeyEvent, app: &mut App, app_arc: &Arc<Mutex<App>>, services: &Arc<Services>) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.login.toggle_focus(),
        KeyCode::Backspace => app.login.pop_char(),
        KeyCode::Enter => {
            if let Some((email, password)) = app.login.begin_submit() {
                tokio::spawn(complete_login(app_arc.clone(), services.clone(), email, password));
            }
        }
        KeyCode::Char(c) => app.login.push_char(c),
        _ => {}
    }
}

fn handle_personas_input(key: KeyEvent, app: &mut App, app_arc: &Arc<Mutex<App>>, services: &Arc<Services>) {
    match key.code {
        KeyCode::Left => app.select_left(),
        KeyCode::Right => app.select_right(),
        KeyCode::Up => app.select_up(),
        KeyCode::Down => app.select_down(),
        KeyCode::Enter => {
            let persona_id = app.selected().id;
            let user_id = services.auth.current_user().map(|u| u.id);
            if let Some(view_id) = app.enter_chat(persona_id, user_id, &services.config) {
                tokio::spawn(mount_chat(app_arc.clone(), services.clone(), view_id));
            }
        }
        KeyCode::Char('l') => {
            tokio::spawn(sign_out(app_arc.clone(), services.clone()));
        }
        KeyCode::Char('q') => app.quit_confirm = true,
        _ => {}
    }
}

fn handle_chat_input(key: KeyEvent, app: &mut App, app_arc: &Arc<Mutex<App>>, services: &Arc<Services>) {
    if key.code == KeyCode::Esc {
        app.show_personas();
        return;
    }

    let Some(view) = app.chat.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Enter => {
            if let Some(pending) = view.submit_input() {
                spawn_send(app_arc, services, view.id, pending);
            }
        }
        KeyCode::Char(c @ '1'..='9') if view.input.is_empty() && view.show_suggestions() => {
            let idx = c as usize - '1' as usize;
            if let Some(suggestion) = view.persona.suggestions.get(idx) {
                if let Some(pending) = view.begin_send(suggestion) {
                    spawn_send(app_arc, services, view.id, pending);
                }
            }
        }
        KeyCode::PageUp | KeyCode::Up => view.scroll_up(),
        KeyCode::PageDown | KeyCode::Down => view.scroll_down(),
        KeyCode::Backspace => {
            view.input.pop();
        }
        KeyCode::Char(c) => view.input.push(c),
        _ => {}
    }
}

pub fn handle_quit_confirm_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            app.should_quit = true;
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            app.quit_confirm = false;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_needs_confirmation() {
        let mut app = App::new(false);
        app.quit_confirm = true;

        handle_quit_confirm_input(press(KeyCode::Char('n')), &mut app);
        assert!(!app.quit_confirm);
        assert!(!app.should_quit);

        app.quit_confirm = true;
        handle_quit_confirm_input(press(KeyCode::Char('y')), &mut app);
        assert!(app.should_quit);
    }
}
