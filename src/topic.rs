//! Topic key normalization
//!
//! Wiki articles are grouped by their `d` tag. User input and cross-reference
//! targets are folded into the same key space before being used as an
//! exact-match filter value: lowercase ASCII letters separated by single
//! hyphens, with no hyphen at either end.

/// Normalize free-form text into a topic key
///
/// Every run of characters that are not letters `a-z` (after lowercasing)
/// collapses into a single hyphen. Leading and trailing separators are
/// dropped, so the result is either empty or matches `^[a-z]+(-[a-z]+)*$`.
///
/// # Examples
///
/// ```
/// use wiki_relay::normalize_topic;
///
/// assert_eq!(normalize_topic("Hello, World!"), "hello-world");
/// assert_eq!(normalize_topic("  --Foo   Bar--  "), "foo-bar");
/// assert_eq!(normalize_topic("42"), "");
/// ```
pub fn normalize_topic(input: &str) -> String {
    let mut key = String::with_capacity(input.len());
    let mut separator = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() {
            if separator && !key.is_empty() {
                key.push('-');
            }
            separator = false;
            key.push(c);
        } else {
            separator = true;
        }
    }

    key
}

/// Check whether a string is already a well-formed topic key
pub fn is_topic_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('-')
        && !key.ends_with('-')
        && !key.contains("--")
        && key.bytes().all(|b| b.is_ascii_lowercase() || b == b'-')
}
