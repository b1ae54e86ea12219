//! Log-safe previews of prompts, responses and credentials

/// Maximum number of characters kept in a logged prompt or response preview
pub const PREVIEW_LEN: usize = 200;

/// Shorten `text` for logging.
///
/// With `full_logging` the text is returned unchanged. Otherwise only the first
/// [`PREVIEW_LEN`] characters are kept, followed by a marker with the number of
/// characters dropped.
pub fn preview(text: &str, full_logging: bool) -> String {
    if full_logging {
        return text.to_string();
    }

    let total = text.chars().count();
    if total <= PREVIEW_LEN {
        return text.to_string();
    }

    let kept: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{}... [{} more chars]", kept, total - PREVIEW_LEN)
}

/// Redact an API key, keeping only its first and last four characters.
///
/// Keys of eight characters or fewer are masked entirely.
pub fn redact_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
