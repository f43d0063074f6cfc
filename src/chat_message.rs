use crate::chat::{Delivery, UiMessage};
use crate::constants::{ERROR, PRIMARY, TEXT};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

/// Renders one message as a framed bubble. User bubbles hug the right edge,
/// assistant bubbles the left.
pub struct Bubble<'a> {
    message: &'a UiMessage,
    accent: Color,
    spinner: &'a str,
}

impl<'a> Bubble<'a> {
    pub fn new(message: &'a UiMessage, accent: Color, spinner: &'a str) -> Self {
        Self {
            message,
            accent,
            spinner,
        }
    }

    pub fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.base_style();
        let body_width = ((width as usize) * 3 / 4).saturating_sub(4).max(8);

        let body: Vec<String> = if self.message.is_loading() {
            vec![format!("{} ...", self.spinner)]
        } else {
            let text = self.message.visible_text();
            if text.is_empty() {
                vec![String::new()]
            } else {
                text.lines()
                    .flat_map(|line| {
                        let wrapped = wrap(line, body_width);
                        if wrapped.is_empty() {
                            vec![String::new()]
                        } else {
                            wrapped.into_iter().map(|w| w.into_owned()).collect()
                        }
                    })
                    .collect()
            }
        };

        let inner = body
            .iter()
            .map(|l| l.width())
            .max()
            .unwrap_or(0)
            .max(self.header_text().width().saturating_sub(2));
        let indent = if self.message.is_user {
            " ".repeat((width as usize).saturating_sub(inner + 4))
        } else {
            String::new()
        };

        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(Line::from(vec![
            Span::raw(indent.clone()),
            Span::styled("┌─".to_string(), style),
            Span::styled(self.header_text(), style.add_modifier(Modifier::DIM)),
        ]));

        for text in body {
            let pad = " ".repeat(inner.saturating_sub(text.width()));
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled("│ ".to_string(), style),
                Span::styled(format!("{}{}", text, pad), self.text_style()),
            ]));
        }

        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled("╰─".to_string(), style),
        ]));
        lines
    }

    fn header_text(&self) -> String {
        format!(
            "{} {}",
            self.message.timestamp.format("%H:%M"),
            self.status_icon()
        )
    }

    fn base_style(&self) -> Style {
        let style = Style::default().fg(if self.message.is_user {
            PRIMARY
        } else {
            self.accent
        });

        match self.message.delivery {
            Delivery::Failed => style.fg(ERROR),
            Delivery::Pending => style.add_modifier(Modifier::DIM),
            Delivery::Resolved => style,
        }
    }

    fn text_style(&self) -> Style {
        match self.message.delivery {
            Delivery::Failed if !self.message.is_user => Style::default().fg(ERROR),
            _ => Style::default().fg(TEXT),
        }
    }

    fn status_icon(&self) -> &'static str {
        match (self.message.delivery, self.message.is_typing()) {
            (Delivery::Pending, _) => "○",
            (Delivery::Failed, _) => "✗",
            (Delivery::Resolved, true) => "●",
            (Delivery::Resolved, false) => "✓",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageKey;
    use chrono::Local;

    fn message(text: &str, is_user: bool, delivery: Delivery) -> UiMessage {
        UiMessage {
            key: MessageKey::Stored("1".to_string()),
            text: text.to_string(),
            is_user,
            delivery,
            typing: None,
            timestamp: Local::now(),
        }
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn long_text_wraps_inside_the_frame() {
        let msg = message(&"слово ".repeat(30), false, Delivery::Resolved);
        let lines = Bubble::new(&msg, PRIMARY, "◐").render(40);

        assert!(lines.len() > 3);
        assert!(plain(&lines[0]).starts_with("┌─"));
        assert!(plain(lines.last().unwrap()).starts_with("╰─"));
        for line in &lines {
            assert!(plain(line).width() <= 40);
        }
    }

    #[test]
    fn user_bubbles_are_right_aligned() {
        let msg = message("Привіт", true, Delivery::Resolved);
        let lines = Bubble::new(&msg, PRIMARY, "◐").render(60);
        assert!(plain(&lines[1]).starts_with("    "));
        assert_eq!(plain(&lines[1]).trim(), "│ Привіт");
    }

    #[test]
    fn placeholder_shows_spinner() {
        let msg = message("", false, Delivery::Pending);
        let lines = Bubble::new(&msg, PRIMARY, "◓").render(60);
        assert!(plain(&lines[1]).contains("◓ ..."));
        assert!(plain(&lines[0]).contains('○'));
    }
}
