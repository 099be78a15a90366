//! Dictionary entries

use serde::{Deserialize, Serialize};

use crate::error::{LexiError, Result};

/// One word of the dictionary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    /// The word itself
    pub content: String,
    /// Relative frequency, used by the tokenizer to weigh segmentations
    pub frequency: f64,
    /// Part-of-speech tag
    pub pos: String,
}

impl DictEntry {
    pub fn new(content: impl Into<String>, frequency: f64, pos: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            frequency,
            pos: pos.into(),
        }
    }

    /// Reject entries the dictionary cannot hold
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(LexiError::InvalidEntry("content is empty".to_string()));
        }
        // Would split the `content frequency pos` line
        if self.content.chars().any(char::is_whitespace) {
            return Err(LexiError::InvalidEntry(format!(
                "content {:?} contains whitespace",
                self.content
            )));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(LexiError::InvalidEntry(format!(
                "frequency of {:?} must be positive, got {}",
                self.content, self.frequency
            )));
        }
        validate_pos(&self.pos)
    }

    /// Line in tokenizer dictionary format: `content frequency pos`
    pub fn to_dict_line(&self) -> String {
        format!("{} {} {}", self.content, self.frequency, self.pos)
    }
}

/// A tag is the last field of a dictionary line, so it must be one
/// non-empty token.
fn validate_pos(pos: &str) -> Result<()> {
    if pos.is_empty() {
        return Err(LexiError::InvalidEntry("tag is empty".to_string()));
    }
    if pos.chars().any(char::is_whitespace) {
        return Err(LexiError::InvalidEntry(format!(
            "tag {:?} contains whitespace",
            pos
        )));
    }
    Ok(())
}
