use crate::app::App;
use crate::chat_message::Bubble;
use crate::constants::{INPUT_PLACEHOLDER, PRIMARY, SECONDARY, TEXT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub fn draw_chat(f: &mut Frame<'_>, area: Rect, app: &mut App) {
    let spinner = app.status_indicator.spinner_frame();
    let Some(view) = app.chat.as_mut() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),    // Messages
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(area);

    let accent = view.persona.card_color();
    let mut lines: Vec<Line> = Vec::new();

    if view.loading_history {
        lines.push(Line::from(Span::styled(
            format!("{} ...", spinner),
            Style::default().fg(PRIMARY),
        )));
    } else if view.show_suggestions() {
        lines.push(Line::from(Span::styled(
            view.persona.greeting(),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        for (i, suggestion) in view.persona.suggestions.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD)),
                Span::styled(suggestion.to_string(), Style::default().fg(TEXT)),
            ]));
        }
    } else {
        for message in &view.messages {
            lines.extend(Bubble::new(message, accent, spinner).render(chunks[0].width));
            lines.push(Line::from(""));
        }
    }

    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let scroll = view.viewport_scroll(total, chunks[0].height);
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), chunks[0]);

    let input_line = if view.input.is_empty() {
        Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(TEXT).add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(Span::styled(view.input.clone(), Style::default().fg(TEXT)))
    };
    // Long input scrolls horizontally so the cursor stays inside the box.
    let visible = chunks[1].width.saturating_sub(3);
    let typed = u16::try_from(view.input.width()).unwrap_or(u16::MAX);
    let input = Paragraph::new(input_line)
        .scroll((0, typed.saturating_sub(visible)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(PRIMARY)),
        );
    f.render_widget(input, chunks[1]);
    f.set_cursor_position((chunks[1].x + 1 + typed.min(visible), chunks[1].y + 1));

    app.status_indicator.render(f, chunks[2]);
}
