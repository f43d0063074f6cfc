use crate::app::{App, AppScreen};
use crate::constants::{
    BACK_LABEL, BRAND_HEADER, HEAVY_DOWN_AND_LEFT, HEAVY_DOWN_AND_RIGHT, HEAVY_HORIZONTAL,
    HEAVY_UP_AND_LEFT, HEAVY_UP_AND_RIGHT, HEAVY_VERTICAL, PRIMARY, WHITE,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Brand bar framed with heavy box glyphs. Inside a chat it also carries the
/// back action and the persona name.
pub fn draw_header(f: &mut Frame<'_>, area: Rect, app: &App) {
    let width = area.width as usize;
    if width < 4 || area.height < 3 {
        return;
    }
    let inner = width - 2;
    let frame_style = Style::default().fg(PRIMARY).bg(WHITE);
    let brand_style = Style::default()
        .fg(PRIMARY)
        .bg(WHITE)
        .add_modifier(Modifier::BOLD);

    let left = match (&app.screen, app.chat.as_ref()) {
        (AppScreen::Chat { .. }, Some(view)) => {
            format!(" ← {} (Esc)  {} ", BACK_LABEL, view.persona.display_name)
        }
        _ => String::from(" "),
    };
    let right = format!("{} ", BRAND_HEADER);
    let gap = inner.saturating_sub(left.width() + right.width());

    let horizontal = HEAVY_HORIZONTAL.to_string().repeat(inner);
    let lines = vec![
        Line::from(Span::styled(
            format!("{}{}{}", HEAVY_DOWN_AND_RIGHT, horizontal, HEAVY_DOWN_AND_LEFT),
            frame_style,
        )),
        Line::from(vec![
            Span::styled(HEAVY_VERTICAL.to_string(), frame_style),
            Span::styled(left, frame_style),
            Span::styled(" ".repeat(gap), frame_style),
            Span::styled(right, brand_style),
            Span::styled(HEAVY_VERTICAL.to_string(), frame_style),
        ]),
        Line::from(Span::styled(
            format!("{}{}{}", HEAVY_UP_AND_RIGHT, horizontal, HEAVY_UP_AND_LEFT),
            frame_style,
        )),
    ];

    f.render_widget(Paragraph::new(lines), area);
}
