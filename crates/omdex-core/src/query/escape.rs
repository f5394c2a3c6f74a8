//! Escaping for query-string fragments.
//!
//! Every escapable character is prefixed, never dropped, so any operand
//! string can pass through a query verbatim.

/// Punctuation the query grammar reserves. Shared by both escape flavors.
const fn is_reserved_punctuation(c: char) -> bool {
    matches!(
        c,
        ',' | '.'
            | '<'
            | '>'
            | '{'
            | '}'
            | '['
            | ']'
            | '"'
            | '\''
            | ':'
            | ';'
            | '!'
            | '@'
            | '#'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | '('
            | ')'
            | '-'
            | '+'
            | '='
            | '~'
            | '|'
    )
}

/// Escape an operand for a tag fragment. Tags separate on whitespace, so
/// spaces are escaped too.
#[must_use]
pub fn escape_tag(value: &str) -> String {
    escape(value, |c| is_reserved_punctuation(c) || c == ' ')
}

/// Escape an operand for a full-text fragment. Spaces stay literal; inside
/// quoted text they separate words rather than terminate the fragment.
#[must_use]
pub fn escape_text(value: &str) -> String {
    escape(value, is_reserved_punctuation)
}

fn escape(value: &str, needs_escape: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

///
/// TESTS
///
