use crate::app::{App, AppScreen};
use crate::constants::TEXT;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Paragraph, Wrap},
    Frame,
};

/// Draws the footer with the key bindings of the current screen.
pub fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &App) {
    let instructions = if app.quit_confirm {
        "'y' щоб вийти, 'n' щоб скасувати."
    } else {
        match app.screen {
            AppScreen::Login => "Tab: інше поле, Enter: увійти, Ctrl+C: вихід.",
            AppScreen::Personas => {
                "Стрілки: вибір персони, Enter: відкрити, 'l': вийти з акаунта, 'q': вихід."
            }
            AppScreen::Chat { .. } => match app.chat.as_ref() {
                Some(view) if view.show_suggestions() => {
                    "Enter: надіслати, 1-3: підказка, PgUp/PgDn: прокрутка, Esc: назад до персон."
                }
                _ => "Enter: надіслати, PgUp/PgDn: прокрутка, Esc: назад до персон.",
            },
        }
    };

    let footer = Paragraph::new(instructions)
        .style(Style::default().fg(TEXT).add_modifier(Modifier::DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(footer, area);
}
