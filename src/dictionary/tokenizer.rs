//! Tokenizer capability consumed by the dictionary cache

use crate::error::Result;

/// Text segmentation with an updatable vocabulary
pub trait Tokenizer: Send {
    /// Split `text` into tokens, in order
    ///
    /// `fine` asks for the most detailed analysis the tokenizer offers,
    /// including discovery of words missing from its vocabulary.
    fn cut(&self, text: &str, fine: bool) -> Vec<String>;

    /// Add or replace a single vocabulary word
    fn add_token(&mut self, word: &str, frequency: f64, pos: &str);

    /// Bulk-load vocabulary, one `word frequency pos` line per word
    ///
    /// Returns the number of words loaded.
    fn load_dictionary(&mut self, text: &str) -> Result<usize>;
}
