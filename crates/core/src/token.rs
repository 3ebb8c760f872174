//! Token estimation.
//!
//! Uses a character-based heuristic: ~4 characters per token, with a floor
//! of 10 tokens per estimated text. This is not a tokenizer; it only has to
//! be deterministic and monotone in text length.

/// Floor applied to every estimate.
pub const MIN_TOKENS: usize = 10;

/// Estimate the token count for a string: `max(10, chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / 4).max(MIN_TOKENS)
}

/// Estimate tokens for several text fragments joined by single spaces.
pub fn estimate_joined(parts: &[&str]) -> usize {
    let chars: usize = parts.iter().map(|p| p.chars().count()).sum::<usize>()
        + parts.len().saturating_sub(1);
    (chars / 4).max(MIN_TOKENS)
}
