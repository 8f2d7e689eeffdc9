/// Rough token estimate used for logging and prompt budgeting: one token
/// per four bytes, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Truncates `s` to at most `max_bytes` bytes at a character boundary.
#[must_use]
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert_eq!(truncated, "Hello ");
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn truncate_within_bounds_is_identity() {
        assert_eq!(truncate_to_char_boundary("Hello", 100), "Hello");
    }
}
