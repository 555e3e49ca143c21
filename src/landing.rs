use crate::ticker::Tick;
use std::time::Duration;

pub const BANNER_TEXT: &str = "Welcome to PDF Question Answering System";
pub const TYPING_DELAY: Duration = Duration::from_millis(100);

/// Character-by-character reveal of the landing banner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Typewriter {
    full_text: &'static str,
    revealed: usize,
    typing: bool,
}

impl Typewriter {
    pub fn new(full_text: &'static str) -> Self {
        Self {
            full_text,
            revealed: 0,
            typing: true,
        }
    }

    /// Reveals one more character, or finishes once everything is shown.
    pub fn advance(&mut self) -> Tick {
        if self.revealed < self.full_text.chars().count() {
            self.revealed += 1;
            Tick::Continue
        } else {
            self.typing = false;
            Tick::Stop
        }
    }

    pub fn visible_text(&self) -> &str {
        match self.full_text.char_indices().nth(self.revealed) {
            Some((end, _)) => &self.full_text[..end],
            None => self.full_text,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(BANNER_TEXT)
    }
}
