//! Dictionary-driven segmenter
//!
//! Han text is segmented along the maximum log-probability route through a
//! DAG of dictionary words; characters the dictionary does not know count as
//! single-character words of frequency 1. With `fine` set, consecutive
//! unknown characters are joined into one candidate word, which is how new
//! vocabulary surfaces. Other scripts are split on character class
//! boundaries:
//!
//! - runs of non-Han letters/digits stay whole ("Rust", "2024")
//! - runs of whitespace stay whole
//! - every other character (punctuation, symbols) is its own token

use std::collections::HashMap;

use crate::error::{LexiError, Result};

use super::Tokenizer;

#[derive(Debug, Clone, PartialEq)]
struct WordInfo {
    frequency: f64,
    pos: String,
}

/// Maximum-probability word segmenter backed by an in-memory vocabulary
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    words: HashMap<String, WordInfo>,
    /// Sum of all word frequencies
    total: f64,
    /// Longest word, in chars; bounds the DAG fan-out
    max_word_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Han,
    Alnum,
    Space,
    Other,
}

fn classify(c: char) -> CharClass {
    if is_han(c) {
        CharClass::Han
    } else if c.is_alphanumeric() {
        CharClass::Alnum
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

/// CJK unified ideographs, extensions A-G and compatibility ideographs
fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFAFF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2EBEF
        | 0x30000..=0x3134F)
}

impl Segmenter {
    /// Empty vocabulary; every Han character becomes its own token
    pub fn new() -> Self {
        Self::default()
    }

    /// Segmenter preloaded with a dictionary in `word frequency pos` lines
    pub fn from_dictionary(text: &str) -> Result<Self> {
        let mut segmenter = Self::new();
        segmenter.load_dictionary(text)?;
        Ok(segmenter)
    }

    /// Number of known words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn frequency(&self, word: &str) -> Option<f64> {
        self.words.get(word).map(|info| info.frequency)
    }

    pub fn pos(&self, word: &str) -> Option<&str> {
        self.words.get(word).map(|info| info.pos.as_str())
    }

    fn insert_word(&mut self, word: &str, frequency: f64, pos: &str) {
        let info = WordInfo {
            frequency,
            pos: pos.to_string(),
        };
        if let Some(old) = self.words.insert(word.to_string(), info) {
            self.total -= old.frequency;
        }
        self.total += frequency;
        self.max_word_chars = self.max_word_chars.max(word.chars().count());
    }

    /// Parse one dictionary line: `word [frequency [pos]]`
    ///
    /// Blank lines and `#` comments yield `None`.
    fn parse_line(line: &str, line_no: usize) -> Result<Option<(&str, f64, &str)>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut fields = line.split_whitespace();
        let word = match fields.next() {
            Some(word) => word,
            None => return Ok(None),
        };

        let frequency = match fields.next() {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                LexiError::Tokenizer(format!("line {}: invalid frequency {:?}", line_no, raw))
            })?,
            None => 1.0,
        };
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(LexiError::Tokenizer(format!(
                "line {}: frequency must be positive, got {}",
                line_no, frequency
            )));
        }

        let pos = fields.next().unwrap_or("");
        Ok(Some((word, frequency, pos)))
    }

    /// Segment a run of Han characters
    fn cut_han(&self, chars: &[char], fine: bool, out: &mut Vec<String>) {
        let n = chars.len();
        let log_total = self.total.max(1.0).ln();
        let fan_out = self.max_word_chars.max(1);

        // route[i] = (best log-probability of chars[i..], end of first word)
        let mut route = vec![(0.0f64, 0usize); n + 1];
        for i in (0..n).rev() {
            let mut best = (f64::NEG_INFINITY, i);
            let mut word = String::new();

            for j in i..n.min(i + fan_out) {
                word.push(chars[j]);
                let frequency = match self.words.get(&word) {
                    Some(info) => info.frequency,
                    None if j == i => 1.0,
                    None => continue,
                };
                let score = frequency.ln() - log_total + route[j + 1].0;
                // Ties go to the longer word
                if score >= best.0 {
                    best = (score, j);
                }
            }
            route[i] = best;
        }

        // Consecutive unknown characters form one candidate word
        let mut unknown_run = String::new();
        let mut i = 0;
        while i < n {
            let j = route[i].1;
            let token: String = chars[i..=j].iter().collect();

            if fine && j == i && !self.words.contains_key(&token) {
                unknown_run.push_str(&token);
            } else {
                if !unknown_run.is_empty() {
                    out.push(std::mem::take(&mut unknown_run));
                }
                out.push(token);
            }
            i = j + 1;
        }
        if !unknown_run.is_empty() {
            out.push(unknown_run);
        }
    }
}

impl Tokenizer for Segmenter {
    fn cut(&self, text: &str, fine: bool) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();

        let mut i = 0;
        while i < chars.len() {
            let class = classify(chars[i]);
            let mut j = i + 1;
            if class != CharClass::Other {
                while j < chars.len() && classify(chars[j]) == class {
                    j += 1;
                }
            }

            match class {
                CharClass::Han => self.cut_han(&chars[i..j], fine, &mut out),
                _ => out.push(chars[i..j].iter().collect()),
            }
            i = j;
        }

        out
    }

    fn add_token(&mut self, word: &str, frequency: f64, pos: &str) {
        if word.is_empty() || !(frequency.is_finite() && frequency > 0.0) {
            tracing::debug!("Ignoring token {:?} with frequency {}", word, frequency);
            return;
        }
        self.insert_word(word, frequency, pos);
    }

    /// All-or-nothing: a malformed line loads nothing
    fn load_dictionary(&mut self, text: &str) -> Result<usize> {
        let mut parsed = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if let Some(word) = Self::parse_line(line, idx + 1)? {
                parsed.push(word);
            }
        }

        for (word, frequency, pos) in &parsed {
            self.insert_word(word, *frequency, pos);
        }
        Ok(parsed.len())
    }
}
