//! ASCII-only string helpers used by the STL keyword grammar.
//!
//! These never perform Unicode case folding: STL keywords and ZIP filenames
//! are matched byte-wise in the ASCII range only.

#[must_use]
pub fn ascii_to_lower(byte: u8) -> u8 {
    byte.to_ascii_lowercase()
}

#[must_use]
pub fn ascii_to_upper(byte: u8) -> u8 {
    byte.to_ascii_uppercase()
}

/// Case-insensitive ASCII equality.
#[must_use]
pub fn ascii_eq_ci(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// True if `haystack` starts with `prefix`, compared case-insensitively.
#[must_use]
pub fn ascii_starts_with_ci(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && ascii_eq_ci(&haystack[..prefix.len()], prefix)
}

/// Trims trailing ASCII whitespace (space, tab, CR, LF) from `s`.
#[must_use]
pub fn trim_trailing_ascii_whitespace(s: &str) -> &str {
    s.trim_end_matches(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n')
}

#[must_use]
pub fn is_ascii_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}
