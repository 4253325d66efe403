/// Continuation marker appended when article bodies are cut down to the
/// configured character budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Truncate `content` to at most `max_length` characters, appending the
/// continuation marker when anything was dropped. Respects char boundaries.
pub fn truncate_with_marker(content: &str, max_length: usize) -> String {
    if content.chars().count() <= max_length {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_length).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

/// Reduce a title to an alphanumeric-and-underscore filename fragment,
/// truncated to `max_length` characters.
pub fn sanitize_filename(title: &str, max_length: usize) -> String {
    title
        .chars()
        .take(max_length)
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}
