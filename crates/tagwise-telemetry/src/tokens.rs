//! Token estimation utilities

/// Characters per token assumed by [`estimate_tokens`]
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a prompt fragment.
///
/// This is a coarse approximation (byte length divided by four, rounded down),
/// not a model tokenizer. Prompt budgets are expressed in this unit, so swapping
/// in a real tokenizer only means changing this function.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}
