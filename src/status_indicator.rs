use crate::constants::{PRIMARY, TEXT};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// One-line activity indicator shown under the chat input.
#[derive(Debug, Default)]
pub struct StatusIndicator {
    thinking: bool,
    status_text: String,
    spinner_idx: usize,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_thinking(&mut self, thinking: bool) {
        self.thinking = thinking;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status_text = status.into();
    }

    pub fn clear_status(&mut self) {
        self.status_text.clear();
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn update_spinner(&mut self) {
        self.spinner_idx = self.spinner_idx.wrapping_add(1);
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_idx % SPINNER_FRAMES.len()]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let indicator = if self.thinking { self.spinner_frame() } else { " " };

        let status_text = if !self.status_text.is_empty() {
            self.status_text.as_str()
        } else if self.thinking {
            "Агент друкує..."
        } else {
            ""
        };

        let status_style = Style::default().fg(TEXT).add_modifier(Modifier::DIM);

        let status = Line::from(vec![
            Span::styled(indicator, Style::default().fg(PRIMARY)),
            Span::raw(" "),
            Span::styled(status_text, status_style),
        ]);

        frame.render_widget(
            Paragraph::new(status).alignment(Alignment::Left),
            Rect {
                height: area.height.min(1),
                ..area
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_cycles_through_frames() {
        let mut status = StatusIndicator::new();
        let first = status.spinner_frame();
        for _ in 0..SPINNER_FRAMES.len() {
            status.update_spinner();
        }
        assert_eq!(status.spinner_frame(), first);
        status.update_spinner();
        assert_ne!(status.spinner_frame(), first);
    }

    #[test]
    fn status_text_is_replaced_and_cleared() {
        let mut status = StatusIndicator::new();
        status.set_status("Завантаження історії...");
        assert_eq!(status.status_text(), "Завантаження історії...");
        status.clear_status();
        assert_eq!(status.status_text(), "");
    }
}
