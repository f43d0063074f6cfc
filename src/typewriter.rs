// src/typewriter.rs

/// Progressive reveal of text that has already arrived.
///
/// Only a character count is tracked; the text itself stays with the message,
/// so interrupting the reveal can never alter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    total: usize,
    revealed: usize,
    step: usize,
}

impl Typewriter {
    pub fn new(text: &str, step: usize) -> Self {
        Self {
            total: text.chars().count(),
            revealed: 0,
            step: step.max(1),
        }
    }

    /// Reveals the next `step` characters. Returns `true` while more remain.
    pub fn tick(&mut self) -> bool {
        self.revealed = (self.revealed + self.step).min(self.total);
        !self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.revealed >= self.total
    }

    /// The revealed prefix of `text`.
    pub fn visible<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.revealed) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_by_characters_not_bytes() {
        let text = "Привіт!";
        let mut tw = Typewriter::new(text, 2);
        assert_eq!(tw.visible(text), "");
        assert!(tw.tick());
        assert_eq!(tw.visible(text), "Пр");
        tw.tick();
        tw.tick();
        assert_eq!(tw.visible(text), "Привіт");
        assert!(!tw.tick());
        assert_eq!(tw.visible(text), text);
    }

    #[test]
    fn large_step_shows_everything_at_once() {
        let text = "Відмінний сервіс";
        let mut tw = Typewriter::new(text, 100);
        assert!(!tw.tick());
        assert!(tw.is_done());
        assert_eq!(tw.visible(text), text);
    }

    #[test]
    fn zero_step_still_advances() {
        let mut tw = Typewriter::new("ab", 0);
        tw.tick();
        assert_eq!(tw.visible("ab"), "a");
    }

    #[test]
    fn empty_text_is_done_immediately() {
        let tw = Typewriter::new("", 3);
        assert!(tw.is_done());
    }
}
