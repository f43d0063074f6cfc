use crate::constants::{PRIMARY, QUIT_PROMPT, QUIT_TITLE, TEXT, WHITE};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Centered confirmation dialog drawn over the current screen.
pub fn draw_quit_confirm(f: &mut Frame<'_>, area: Rect) {
    let width = area.width.min(44);
    let height = area.height.min(6);
    let dialog = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .title(QUIT_TITLE)
        .style(Style::default().fg(PRIMARY).bg(WHITE));

    let paragraph = Paragraph::new(QUIT_PROMPT)
        .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, dialog);
    f.render_widget(paragraph, dialog);
}
