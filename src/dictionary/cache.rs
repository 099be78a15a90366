//! Dictionary cache
//!
//! Keeps three views of the vocabulary in step: the engine (durable, one
//! record per word), the trie (lookups) and the tokenizer (segmentation).
//!
//! ## Record Layout
//! ```text
//! key   = UTF-8 bytes of the word
//! value = bincode DictEntry { content, frequency, pos }
//! ```
//!
//! All mutation goes through `&mut self`, so a cache has exactly one
//! writer. Share it behind a lock if several threads must add words.

use std::sync::Arc;

use crate::codec;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{LexiError, Result};
use crate::lifecycle::LifecycleManager;
use crate::txn::IterOptions;

use super::{is_noise, DictEntry, Segmenter, Tokenizer, TrieIndex};

/// Trie-indexed dictionary backed by a managed engine
pub struct DictionaryCache<T: Tokenizer = Segmenter> {
    store: LifecycleManager<Engine>,
    trie: TrieIndex,
    tokenizer: T,
    learn_frequency: f64,
    learn_pos: String,
}

impl DictionaryCache<Segmenter> {
    /// Open the engine at `config.data_dir` and bootstrap an empty segmenter
    pub fn open_default(config: Config) -> Result<Self> {
        let learn = config.clone();
        let store = LifecycleManager::open(config)?;
        Self::open(store, Segmenter::new(), &learn)
    }
}

impl<T: Tokenizer> DictionaryCache<T> {
    /// Rebuild the dictionary from every record in `store`
    ///
    /// Any record that does not decode aborts the open with
    /// `LexiError::Bootstrap`; the cache never starts half populated.
    pub fn open(store: LifecycleManager<Engine>, tokenizer: T, config: &Config) -> Result<Self> {
        config.validate()?;

        let mut cache = Self {
            store,
            trie: TrieIndex::new(),
            tokenizer,
            learn_frequency: config.learn_frequency,
            learn_pos: config.learn_pos.clone(),
        };
        cache.bootstrap().map_err(LexiError::bootstrap)?;
        Ok(cache)
    }

    fn bootstrap(&mut self) -> Result<()> {
        let records = self
            .store
            .engine()
            .view(|txn| Ok(txn.iter(IterOptions::default())?.collect::<Vec<_>>()))?;

        for item in records {
            let (key, value) = item.into_parts();
            let content = String::from_utf8(key).map_err(|e| {
                LexiError::InvalidEntry(format!("key is not UTF-8: {:?}", e.as_bytes()))
            })?;
            let entry: DictEntry = codec::decode(&value.unwrap_or_default())?;
            self.trie.insert(&content, entry);
        }

        let lines: Vec<String> = self
            .trie
            .traverse()
            .into_iter()
            .map(DictEntry::to_dict_line)
            .collect();
        if !lines.is_empty() {
            let loaded = self.tokenizer.load_dictionary(&lines.join("\n"))?;
            tracing::debug!("Tokenizer loaded {} words", loaded);
        }

        tracing::info!("Dictionary bootstrapped with {} words", self.trie.len());
        Ok(())
    }

    /// Add or replace a word
    ///
    /// The record is written first; the trie and the tokenizer only change
    /// once the write succeeded.
    pub fn add_word(&mut self, content: &str, frequency: f64, pos: &str) -> Result<()> {
        let entry = DictEntry::new(content, frequency, pos);
        entry.validate()?;

        let value = codec::encode(&entry)?;
        self.store.engine().set(content.as_bytes(), &value)?;

        self.trie.insert(content, entry);
        self.tokenizer.add_token(content, frequency, pos);
        Ok(())
    }

    /// Add every new word the tokenizer finds in `text`
    ///
    /// Noise tokens and words already known are skipped. Learned words get
    /// the configured frequency and tag. The first failed write stops the
    /// pass; words learned before it stay learned. Returns the new words in
    /// the order they were added.
    pub fn learn_from_text(&mut self, text: &str) -> Result<Vec<String>> {
        let mut learned = Vec::new();

        for token in self.tokenizer.cut(text, true) {
            if is_noise(&token) || self.trie.contains(&token) {
                continue;
            }

            let frequency = self.learn_frequency;
            let pos = self.learn_pos.clone();
            self.add_word(&token, frequency, &pos)?;

            tracing::info!("Learned {:?}", token);
            learned.push(token);
        }

        Ok(learned)
    }

    /// Segment `text` with the current vocabulary
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.tokenizer.cut(text, true)
    }

    pub fn contains(&self, content: &str) -> bool {
        self.trie.contains(content)
    }

    pub fn entry(&self, content: &str) -> Option<&DictEntry> {
        self.trie.get(content)
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    pub fn trie(&self) -> &TrieIndex {
        &self.trie
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// The managed store
    pub fn store(&self) -> &LifecycleManager<Engine> {
        &self.store
    }

    /// Shortcut to the engine under management
    pub fn engine(&self) -> &Arc<Engine> {
        self.store.engine()
    }

    /// Stop maintenance and close the engine
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}
