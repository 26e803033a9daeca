//! Error types for response coercion.

/// Maximum number of characters of offending text kept in a [`ParseError`].
pub const EXCERPT_LEN: usize = 300;

/// Errors returned by [`parse_loose_json`](super::parse_loose_json).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The reply was empty or whitespace-only.
    #[error("Cannot parse JSON from model output: empty response")]
    EmptyResponse,

    /// No repair attempt produced valid JSON.
    #[error("Cannot parse JSON from model output: {text:?}")]
    Unparseable {
        /// A truncated copy of the reply text.
        text: String,
    },

    /// Valid JSON was found, but it is not an object.
    #[error("Model output is valid JSON but not a JSON object (found {kind}): {text:?}")]
    NotAnObject {
        /// JSON kind that was found (`array`, `string`, `number`, ...).
        kind: &'static str,
        /// A truncated copy of the reply text.
        text: String,
    },
}

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}
