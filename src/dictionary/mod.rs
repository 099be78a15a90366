//! Dictionary Module
//!
//! A trie-indexed word dictionary kept consistent with the engine and a
//! tokenizer.
//!
//! ```text
//!            ┌──────────────────────┐
//!            │   DictionaryCache    │
//!            └──┬────────┬───────┬──┘
//!               │        │       │
//!               ▼        ▼       ▼
//!        ┌──────────┐ ┌──────┐ ┌───────────┐
//!        │TrieIndex │ │Engine│ │ Tokenizer │
//!        │(in mem)  │ │(disk)│ │(vocabulary)│
//!        └──────────┘ └──────┘ └───────────┘
//! ```
//!
//! The engine is the source of truth: the trie is rebuilt from a full scan
//! on open, and the tokenizer is bulk-loaded from the trie right after.

mod cache;
mod entry;
mod segmenter;
mod text;
mod tokenizer;
mod trie;

pub use cache::DictionaryCache;
pub use entry::DictEntry;
pub use segmenter::Segmenter;
pub use text::{is_noise, is_special};
pub use tokenizer::Tokenizer;
pub use trie::{TrieIndex, TrieNode};
