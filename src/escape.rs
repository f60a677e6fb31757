//! Storage-safety escaping.
//!
//! Backslash-escapes the characters that can terminate or corrupt a quoted
//! context downstream (`\`, NUL, `\n`, `\r`, `'`, `"`, `\x1a`).

use crate::Error;

/// Escapes `value` for embedding in a downstream quoted context.
///
/// A backslash that already starts one of the escape pairs this function
/// produces (`\\`, `\0`, `\n`, `\r`, `\'`, `\"`, `\Z`) is passed through
/// untouched, so the escaper is idempotent: `escape(escape(x)) == escape(x)`.
/// Any other backslash is doubled. The output never contains a quote that is
/// not preceded by an escaping backslash.
///
/// # Examples
///
/// ```
/// use safely::escape;
///
/// assert_eq!(escape("it's"), r"it\'s");
/// assert_eq!(escape("a\nb"), r"a\nb");
/// assert_eq!(escape(&escape("say \"hi\"")), escape("say \"hi\""));
/// ```
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + value.len() / 8);
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if is_escape_suffix(next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            other => out.push(other),
        }
    }
    out
}

/// Detects the encoding of a raw payload and escapes it.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the payload is not UTF-8 (ASCII is a
/// subset). Callers must abandon the payload; there is no lossy fallback.
pub fn escape_bytes(raw: &[u8]) -> Result<String, Error> {
    detect_utf8(raw).map(escape)
}

pub(crate) fn detect_utf8(raw: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(raw).map_err(|_| {
        tracing::error!(len = raw.len(), "character encoding detection failed");
        Error::Encoding
    })
}

fn is_escape_suffix(c: char) -> bool {
    matches!(c, '\\' | '0' | 'n' | 'r' | '\'' | '"' | 'Z')
}
