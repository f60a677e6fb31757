//! URL, email and filename predicates.

use std::net::{Ipv4Addr, Ipv6Addr};

use url::Url;

/// Schemes accepted by [`is_valid_url`].
pub const DEFAULT_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp", "sftp"];

/// Filenames must be strictly shorter than this many code points.
pub const MAX_FILENAME_CHARS: usize = 250;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Returns true if `value` is an absolute URL with a default scheme and a
/// non-empty host.
///
/// A value without a scheme is rejected here; the `url` format's
/// assume-`http://` retry lives in the coercer, not in this predicate.
///
/// # Examples
///
/// ```
/// use safely::is_valid_url;
///
/// assert!(is_valid_url("http://www.usc.edu"));
/// assert!(!is_valid_url("htp://www.usc.edu"));
/// assert!(!is_valid_url("www.usc.edu"));
/// ```
pub fn is_valid_url(value: &str) -> bool {
    is_valid_url_with(value, DEFAULT_URL_SCHEMES)
}

/// Like [`is_valid_url`] with a caller-supplied scheme list.
///
/// Values containing whitespace or control characters are rejected outright,
/// since the URL parser would otherwise silently strip them.
pub fn is_valid_url_with(value: &str, schemes: &[&str]) -> bool {
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            schemes.iter().any(|s| s.eq_ignore_ascii_case(url.scheme()))
                && url.host_str().is_some_and(|h| !h.trim().is_empty())
        }
        Err(_) => false,
    }
}

/// Returns true if `value` parses as a relative reference, i.e. it has no
/// scheme at all.
pub(crate) fn lacks_scheme(value: &str) -> bool {
    matches!(
        Url::parse(value),
        Err(url::ParseError::RelativeUrlWithoutBase)
    )
}

/// Returns true if `value` is an RFC 5322-shaped mailbox, `local@domain`.
///
/// The local part is either a dot-atom or a quoted string (which may contain
/// `@`, spaces and backslash-escaped quotes). The domain is a dotted host
/// name or a bracketed IP literal.
///
/// # Examples
///
/// ```
/// use safely::is_valid_email;
///
/// assert!(is_valid_email("ttrojan@usc.edu"));
/// assert!(is_valid_email(r#""john..doe@home"@example.com"#));
/// assert!(!is_valid_email("A@b@c@example.com"));
/// assert!(!is_valid_email("just\"not\"right@example.com"));
/// ```
pub fn is_valid_email(value: &str) -> bool {
    if value.len() > MAX_EMAIL_LEN {
        return false;
    }
    match split_mailbox(value) {
        Some((local, domain)) => local.len() <= MAX_LOCAL_PART_LEN && is_valid_domain(domain),
        None => false,
    }
}

/// Returns true if `value` is a relative path of `[A-Za-z0-9_-]`, `/` and
/// single dots, shorter than [`MAX_FILENAME_CHARS`].
///
/// `..` anywhere is rejected, which rules out path traversal.
///
/// # Examples
///
/// ```
/// use safely::is_valid_filename;
///
/// assert!(is_valid_filename("one/two/three.txt"));
/// assert!(!is_valid_filename("../etc/passwd"));
/// ```
pub fn is_valid_filename(value: &str) -> bool {
    !value.is_empty()
        && value.chars().count() < MAX_FILENAME_CHARS
        && !value.contains("..")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '.'))
}

fn split_mailbox(value: &str) -> Option<(&str, &str)> {
    if value.starts_with('"') {
        let end = quoted_string_end(value)?;
        let domain = value[end..].strip_prefix('@')?;
        Some((&value[..end], domain))
    } else {
        let (local, domain) = value.split_once('@')?;
        is_dot_atom(local).then_some((local, domain))
    }
}

/// Byte index just past the closing quote of a quoted local part.
fn quoted_string_end(value: &str) -> Option<usize> {
    let mut chars = value.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some(i + 1),
            '\\' => match chars.next() {
                Some((_, escaped)) if escaped == '\t' || is_printable_ascii(escaped) => {}
                _ => return None,
            },
            c if is_printable_ascii(c) => {}
            _ => return None,
        }
    }
    None
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

fn is_printable_ascii(c: char) -> bool {
    (' '..='~').contains(&c)
}

fn is_valid_domain(domain: &str) -> bool {
    if let Some(literal) = domain
        .strip_prefix('[')
        .and_then(|d| d.strip_suffix(']'))
    {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        };
    }

    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_accepts_allowed_schemes_with_host() {
        for url in [
            "http://www.usc.edu",
            "https://example.com/path?q=1#frag",
            "ftp://files.example.com/pub",
            "sftp://user@host.example.com/home",
        ] {
            assert!(is_valid_url(url), "{}", url);
        }
    }

    #[test]
    fn url_rejects_bad_scheme_or_missing_host() {
        for url in [
            "htp://www.usc.edu",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "mailto:someone@example.com",
            "www.usc.edu",
            "",
            "http://exa mple.com",
            "http://example.com/\npath",
        ] {
            assert!(!is_valid_url(url), "{:?}", url);
        }
    }

    #[test]
    fn url_custom_schemes() {
        assert!(is_valid_url_with("gopher://example.com", &["gopher"]));
        assert!(!is_valid_url_with("http://example.com", &["https"]));
    }

    #[test]
    fn lacks_scheme_detects_relative_values() {
        assert!(lacks_scheme("www.usc.edu"));
        assert!(lacks_scheme("/path/only"));
        assert!(!lacks_scheme("htp://www.usc.edu"));
        assert!(!lacks_scheme("http://www.usc.edu"));
    }

    #[test]
    fn email_accepts_rfc_mailboxes() {
        for email in [
            "ttrojan@usc.edu",
            "niceandsimple@example.com",
            "very.common@example.com",
            "a.little.lengthy.but.fine@dept.example.com",
            "disposable.style.email.with+symbol@example.com",
            "other.email-with-dash@example.com",
            r#""very.(),:;<>[]\".VERY.\"very@\ \"very\".unusual"@strange.example.com"#,
            "user@[192.168.2.1]",
            "user@[IPv6:2001:db8::1]",
        ] {
            assert!(is_valid_email(email), "{}", email);
        }
    }

    #[test]
    fn email_rejects_malformed_mailboxes() {
        for email in [
            "3@c@ttrojan@usc.edu",
            "Abc.example.com",
            "A@b@c@example.com",
            r#"a"b(c)d,e:f;g<h>i[j\k]l@example.com"#,
            r#"just"not"right@example.com"#,
            r#"this is"not\allowed@example.com"#,
            r#"this\ still\"not\allowed@example.com"#,
            "@example.com",
            "user@",
            "user@localhost",
            "user@-bad-.com",
            "dot.@example.com",
            r#""unterminated@example.com"#,
        ] {
            assert!(!is_valid_email(email), "{}", email);
        }
    }

    #[test]
    fn email_enforces_length_limits() {
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(!is_valid_email(&long_local));
        let ok_local = format!("{}@example.com", "a".repeat(64));
        assert!(is_valid_email(&ok_local));
    }

    #[test]
    fn filename_rules() {
        assert!(is_valid_filename("one/two/three.txt"));
        assert!(is_valid_filename("/var/data/file_1-a.TXT"));
        assert!(is_valid_filename(".hidden"));
        assert!(!is_valid_filename("../etc/passwd"));
        assert!(!is_valid_filename("a/../b"));
        assert!(!is_valid_filename("name with space"));
        assert!(!is_valid_filename("semi;colon"));
        assert!(!is_valid_filename(""));
    }

    #[test]
    fn filename_length_is_strictly_bounded() {
        assert!(is_valid_filename(&"a".repeat(MAX_FILENAME_CHARS - 1)));
        assert!(!is_valid_filename(&"a".repeat(MAX_FILENAME_CHARS)));
    }
}
