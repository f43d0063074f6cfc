use crate::constants::{
    EMAIL_PLACEHOLDER, ERROR, LOGIN_SUBTITLE, LOGIN_TITLE, PASSWORD_PLACEHOLDER, PRIMARY,
    SUBMIT_LABEL, TEXT, WHITE,
};
use crate::login::{LoginField, LoginForm};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const CARD_WIDTH: u16 = 52;

pub fn draw_login(f: &mut Frame<'_>, area: Rect, form: &LoginForm) {
    let width = area.width.min(CARD_WIDTH);
    let card = Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(3), // email
            Constraint::Length(1), // email error
            Constraint::Length(3), // password
            Constraint::Length(1), // password error
            Constraint::Length(2), // auth error
            Constraint::Length(3), // submit
            Constraint::Min(0),
        ])
        .split(card);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            LOGIN_TITLE,
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(LOGIN_SUBTITLE, Style::default().fg(TEXT))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(title, chunks[0]);

    let masked = "•".repeat(form.password.chars().count());
    draw_field(f, chunks[1], "Email", &form.email, EMAIL_PLACEHOLDER, form.focus == LoginField::Email);
    draw_error(f, chunks[2], form.errors.email.as_deref());
    draw_field(f, chunks[3], "Пароль", &masked, PASSWORD_PLACEHOLDER, form.focus == LoginField::Password);
    draw_error(f, chunks[4], form.errors.password.as_deref());
    draw_error(f, chunks[5], form.auth_error.as_deref());

    let label = if form.submitting { "..." } else { SUBMIT_LABEL };
    let submit = Paragraph::new(label)
        .style(Style::default().fg(WHITE).bg(PRIMARY).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(submit, chunks[6]);

    let (focused, value) = match form.focus {
        LoginField::Email => (chunks[1], form.email.as_str()),
        LoginField::Password => (chunks[3], masked.as_str()),
    };
    let offset = (value.width() as u16).min(focused.width.saturating_sub(3));
    f.set_cursor_position((focused.x + 1 + offset, focused.y + 1));
}

fn draw_field(f: &mut Frame<'_>, area: Rect, title: &str, value: &str, placeholder: &str, focused: bool) {
    let border = if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(TEXT).add_modifier(Modifier::DIM)
    };
    let content = if value.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(TEXT).add_modifier(Modifier::DIM))
    } else {
        Span::styled(value.to_string(), Style::default().fg(TEXT))
    };

    let field = Paragraph::new(Line::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(format!(" {} ", title)),
    );
    f.render_widget(field, area);
}

fn draw_error(f: &mut Frame<'_>, area: Rect, error: Option<&str>) {
    if let Some(error) = error {
        let paragraph = Paragraph::new(error)
            .style(Style::default().fg(ERROR))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }
}
