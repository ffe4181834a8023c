//! Request text validation.
//!
//! Rejects malformed input before any expensive work begins. Square
//! brackets are emotion/prosody markers for the synthesis engine, so an
//! opening bracket without a matching close later in the text is malformed
//! and must never reach the engine. Length is not validated here; captions
//! are truncated at delivery time instead.

use std::fmt;

/// Why a request text was rejected.
///
/// Machine-readable; the caller renders it in the requester's locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The text is empty.
    EmptyText,
    /// A `[` has no matching `]` later in the text.
    UnpairedBracket,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => f.write_str("text is empty"),
            Self::UnpairedBracket => f.write_str("unpaired '[' in text"),
        }
    }
}

/// Validates request text. Pure function, no side effects.
pub fn validate_text(text: &str) -> Result<(), ValidationFailure> {
    if text.is_empty() {
        return Err(ValidationFailure::EmptyText);
    }

    // Every segment after a '[' must contain the closing ']'.
    for segment in text.split('[').skip(1) {
        if !segment.contains(']') {
            return Err(ValidationFailure::UnpairedBracket);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes() {
        assert_eq!(validate_text("Hello world"), Ok(()));
    }

    #[test]
    fn balanced_brackets_pass() {
        assert_eq!(validate_text("Hello [laughs] world"), Ok(()));
        assert_eq!(validate_text("[sighs] so [pauses] it goes"), Ok(()));
    }

    #[test]
    fn unpaired_opening_bracket_fails() {
        assert_eq!(
            validate_text("test [oops"),
            Err(ValidationFailure::UnpairedBracket)
        );
        assert_eq!(
            validate_text("a [ok] then [broken"),
            Err(ValidationFailure::UnpairedBracket)
        );
    }

    #[test]
    fn lone_closing_bracket_passes() {
        // Only unmatched '[' is malformed; a stray ']' is harmless.
        assert_eq!(validate_text("weird ] text"), Ok(()));
    }

    #[test]
    fn empty_text_fails() {
        assert_eq!(validate_text(""), Err(ValidationFailure::EmptyText));
    }
}
