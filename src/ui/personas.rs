use crate::app::GRID_COLUMNS;
use crate::constants::{PERSONAS_TITLE, PRIMARY, TEXT, WHITE};
use crate::personas::{self, Persona};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

pub fn draw_personas(f: &mut Frame<'_>, area: Rect, selected: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let title = Paragraph::new(PERSONAS_TITLE)
        .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let all = personas::all();
    let rows = all.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(chunks[1]);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let idx = row * GRID_COLUMNS + col;
            if let Some(persona) = all.get(idx) {
                draw_card(f, *cell, persona, idx == selected);
            }
        }
    }
}

fn draw_card(f: &mut Frame<'_>, area: Rect, persona: &Persona, selected: bool) {
    let background = persona.card_color();
    let foreground = if persona.is_light() { TEXT } else { WHITE };

    let border_style = if selected {
        Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(background)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
        .border_style(border_style)
        .style(Style::default().bg(background).fg(foreground));

    let marker = if selected { "➤ " } else { "" };
    let text = vec![
        Line::from(Span::styled(
            format!("{}{}", marker, persona.display_name),
            Style::default().fg(foreground).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(persona.description, Style::default().fg(foreground))),
    ];

    let card = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(card, area);
}
