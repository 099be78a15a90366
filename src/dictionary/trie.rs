//! Prefix tree over Unicode scalar values
//!
//! Each edge is one `char`, so a multi-byte character is a single step.
//! A node is terminal exactly when it holds an entry.

use std::collections::HashMap;

use super::DictEntry;

/// A node of the prefix tree
#[derive(Debug, Default)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    entry: Option<DictEntry>,
}

impl TrieNode {
    /// Whether a stored word ends here
    pub fn is_terminal(&self) -> bool {
        self.entry.is_some()
    }

    pub fn entry(&self) -> Option<&DictEntry> {
        self.entry.as_ref()
    }

    pub fn child(&self, c: char) -> Option<&TrieNode> {
        self.children.get(&c)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// In-memory index of dictionary entries keyed by their text
#[derive(Debug, Default)]
pub struct TrieIndex {
    /// Sentinel; never terminal
    root: TrieNode,
    len: usize,
}

impl TrieIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entry` at the path spelled by `content`
    ///
    /// Replaces and returns the previous entry for the same content. An
    /// empty `content` is ignored, the root never holds an entry.
    pub fn insert(&mut self, content: &str, entry: DictEntry) -> Option<DictEntry> {
        if content.is_empty() {
            return None;
        }

        let mut node = &mut self.root;
        for c in content.chars() {
            node = node.children.entry(c).or_default();
        }

        let previous = node.entry.replace(entry);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Whether `content` is a stored word (a prefix of one does not count)
    pub fn contains(&self, content: &str) -> bool {
        self.get(content).is_some()
    }

    /// Entry stored for `content`
    pub fn get(&self, content: &str) -> Option<&DictEntry> {
        self.find(content)?.entry()
    }

    /// Node at the end of the path spelled by `content`
    pub fn find(&self, content: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in content.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }

    /// Every stored entry exactly once, depth-first, in no particular order
    pub fn traverse(&self) -> Vec<&DictEntry> {
        let mut entries = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            if let Some(entry) = &node.entry {
                entries.push(entry);
            }
            stack.extend(node.children.values());
        }

        entries
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }
}
