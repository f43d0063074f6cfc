// src/ui.rs

pub mod chat;
pub mod footer;
pub mod header;
pub mod login;
pub mod personas;
pub mod quit_confirm;

use crate::app::{App, AppScreen, Services};
use crate::errors::AgentResult;
use crate::key_handlers::handle_key;
use crossterm::{
    event::{self, Event as CEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::{mpsc, Mutex};

use crate::constants::{BACKGROUND, TEXT};

const TICK_RATE: Duration = Duration::from_millis(50);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Enum for different types of events.
enum Event {
    Input(CEvent),
    Tick,
}

/// Runs the terminal UI until the user quits.
pub async fn run_ui(app: Arc<Mutex<App>>, services: Arc<Services>) -> AgentResult<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, services).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: Arc<Mutex<App>>,
    services: Arc<Services>,
) -> AgentResult<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(event) => {
                    if input_tx.blocking_send(Event::Input(event)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read terminal event: {}", e);
                    return;
                }
            },
            Ok(false) => {
                if input_tx.is_closed() {
                    return;
                }
            }
            Err(e) => {
                log::error!("Failed to poll terminal events: {}", e);
                return;
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_RATE);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).await.is_err() {
                return;
            }
        }
    });

    let mut auth_changes = services.auth.subscribe();

    loop {
        {
            let mut guard = app.lock().await;
            if guard.should_quit {
                break;
            }
            terminal.draw(|f| draw(f, &mut guard))?;
        }

        tokio::select! {
            Some(event) = rx.recv() => match event {
                Event::Input(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    let mut guard = app.lock().await;
                    handle_key(key, &mut guard, &app, &services);
                }
                Event::Input(_) => {}
                Event::Tick => app.lock().await.on_tick(),
            },
            Ok(()) = auth_changes.changed() => {
                let state = auth_changes.borrow_and_update().clone();
                app.lock().await.apply_auth(&state);
            }
            else => break,
        }
    }

    log::info!("UI loop finished");
    Ok(())
}

/// Renders the UI components.
pub fn draw(f: &mut Frame, app: &mut App) {
    f.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND).fg(TEXT)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    header::draw_header(f, chunks[0], app);

    match app.screen {
        AppScreen::Login => login::draw_login(f, chunks[1], &app.login),
        AppScreen::Personas => personas::draw_personas(f, chunks[1], app.selected_persona),
        AppScreen::Chat { .. } => chat::draw_chat(f, chunks[1], app),
    }

    footer::draw_footer(f, chunks[2], app);

    if app.quit_confirm {
        quit_confirm::draw_quit_confirm(f, f.area());
    }
}
