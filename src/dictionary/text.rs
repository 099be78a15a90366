//! Token classification helpers

use std::sync::OnceLock;

use regex::Regex;

/// Punctuation, symbols, separators and whitespace, nothing else
fn special_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\p{P}\p{S}\p{Z}\s]+$").expect("static pattern is valid")
    })
}

/// Whether `token` is made only of punctuation, symbol or separator
/// characters (Unicode general categories P, S and Z) or whitespace
pub fn is_special(token: &str) -> bool {
    !token.is_empty() && special_pattern().is_match(token)
}

/// Whether a token is too short or too symbolic to be learned as a word
pub fn is_noise(token: &str) -> bool {
    token.chars().nth(1).is_none() || is_special(token)
}
