//! Canonical derived names.
//!
//! This is the only place a document or index key is turned into an agent
//! name. Discovery of documents and discovery of persisted indexes both call
//! [`derive_name`], so the two sides always agree on the join key.

use unicode_normalization::UnicodeNormalization;

/// Separator placed between the words of a derived name.
pub const NAME_SEPARATOR: char = '_';

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '_'
}

/// Derive the canonical name for a raw document stem or index key.
///
/// Rules:
/// 1. Unicode NFC normalization
/// 2. Every maximal run of whitespace, `-` and `_` becomes one `_`
/// 3. Leading and trailing separators are dropped
///
/// Case is preserved. The function is idempotent.
pub fn derive_name(raw: &str) -> String {
    let normalized: String = raw.nfc().collect();
    normalized
        .split(is_separator)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(&NAME_SEPARATOR.to_string())
}

/// Human-readable form of a derived name (`_` shown as a space).
pub fn spaced(name: &str) -> String {
    name.replace(NAME_SEPARATOR, " ")
}
