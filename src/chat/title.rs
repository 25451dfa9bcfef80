/// Title given to chats that have no messages yet.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Longest title kept before truncation.
const MAX_TITLE_CHARS: usize = 40;

/// Derive a chat title from the first user message.
///
/// Runs of whitespace collapse to single spaces and the result is capped
/// at 40 characters, with a trailing ellipsis when something was cut.
pub fn derive_title(first_message: &str) -> String {
    let cleaned = first_message.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= MAX_TITLE_CHARS {
        return cleaned;
    }

    let head: String = cleaned.chars().take(MAX_TITLE_CHARS).collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_becomes_title_verbatim() {
        assert_eq!(derive_title("What is Rust?"), "What is Rust?");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(
            derive_title("  What \t is\n\n   Rust?  "),
            "What is Rust?"
        );
    }

    #[test]
    fn test_exactly_forty_chars_kept_without_ellipsis() {
        let input = "a".repeat(40);
        assert_eq!(derive_title(&input), input);
    }

    #[test]
    fn test_long_message_truncates_with_ellipsis() {
        let input = "a".repeat(50);
        assert_eq!(derive_title(&input), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn test_cut_point_trailing_space_is_trimmed() {
        // 39 chars, then a space at index 39, so the cut ends on the space
        let input = format!("{} bbb", "a".repeat(39));
        assert_eq!(derive_title(&input), format!("{}...", "a".repeat(39)));
    }
}
