use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase and trim a piece of text so it can be compared against other words
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A single entry of the word bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    text: String,
    level: u32,
    source: String,
}

impl Word {
    /// Build a word, normalizing its text. Levels below 1 are raised to 1.
    pub fn new(text: &str, level: u32, source: &str) -> Self {
        Self {
            text: normalize(text),
            level: level.max(1),
            source: source.trim().to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (level {})", self.text, self.level)
    }
}
