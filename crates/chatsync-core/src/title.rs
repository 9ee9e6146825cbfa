//! Conversation title derivation.
//!
//! A conversation still carrying the default title is renamed after its
//! first successful save, using the first text part of the first user
//! message, cut to a fixed number of characters.

use chatsync_types::message::{Message, MessageRole};

/// Whether `current` should be replaced by a derived title.
///
/// True for a blank title or one equal to the configured default.
pub fn needs_derived_title(current: &str, default_title: &str) -> bool {
    current.trim().is_empty() || current == default_title
}

/// Cut `text` to `max_chars` characters, appending `ellipsis` if anything was cut.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-character.
pub fn truncate_title(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ellipsis}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Title for a transcript: the first user message's first text part, truncated.
///
/// Returns `None` when there is no user message or its first text part is empty.
pub fn derive_title(transcript: &[Message], max_chars: usize, ellipsis: &str) -> Option<String> {
    let first_user = transcript.iter().find(|m| m.role == MessageRole::User)?;
    let text = first_user.first_text()?;
    if text.is_empty() {
        return None;
    }
    Some(truncate_title(text, max_chars, ellipsis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatsync_types::message::MessagePart;

    #[test]
    fn test_long_text_is_cut_with_ellipsis() {
        let text = "Hello world, this is a longer test message";
        let title = truncate_title(text, 30, "...");
        assert_eq!(title, "Hello world, this is a longer ...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_exactly_max_chars_is_unchanged() {
        let text = "a".repeat(30);
        assert_eq!(truncate_title(&text, 30, "..."), text);
    }

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_title("Short one", 30, "..."), "Short one");
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "あ".repeat(31);
        let title = truncate_title(&text, 30, "...");
        assert_eq!(title, format!("{}...", "あ".repeat(30)));
    }

    #[test]
    fn test_derive_uses_first_user_message_first_text_part() {
        let mut first = Message::user("Plan my trip");
        first.parts.push(MessagePart::text(" to Osaka"));
        let transcript = vec![
            Message::assistant("Welcome!"),
            first,
            Message::user("Something else"),
        ];
        assert_eq!(
            derive_title(&transcript, 30, "...").as_deref(),
            Some("Plan my trip")
        );
    }

    #[test]
    fn test_derive_none_without_user_text() {
        assert!(derive_title(&[Message::assistant("hi")], 30, "...").is_none());
        assert!(derive_title(&[Message::user("")], 30, "...").is_none());
        assert!(derive_title(&[], 30, "...").is_none());
    }

    #[test]
    fn test_needs_derived_title() {
        assert!(needs_derived_title("新しいチャット", "新しいチャット"));
        assert!(needs_derived_title("  ", "新しいチャット"));
        assert!(!needs_derived_title("My renamed chat", "新しいチャット"));
    }
}
