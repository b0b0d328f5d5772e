//! Token estimation and character budgets.
//!
//! Uses a character-based heuristic: 4 characters per token. Budgets are
//! expressed in tokens and enforced in characters.

use serde::{Deserialize, Serialize};

/// Fixed characters-per-token ratio used for every budget.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Maximum context volume for a single completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    pub max_tokens: usize,
    pub max_chars: usize,
}

impl ContextBudget {
    pub fn from_tokens(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            max_chars: max_tokens.saturating_mul(CHARS_PER_TOKEN),
        }
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::from_tokens(16_000)
    }
}

/// The first `n` characters of `s`.
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

/// The last `n` characters of `s`.
pub fn char_suffix(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((byte, _)) => &s[byte..],
        None => s,
    }
}
