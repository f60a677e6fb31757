//! HTML sanitization pipeline.
//!
//! Five total stages, applied in order by [`sanitize_html`]:
//!
//! 1. [`encode_entities`]: non-ASCII code points become `&#NNN;`
//! 2. [`filter_tags`]: tags outside the element allow-list are removed
//! 3. [`filter_attributes`]: attributes outside the attribute allow-list,
//!    or carrying a blocked scheme such as `javascript:`, are removed
//! 4. [`escape_text_quotes`]: quotes in character data become entities
//! 5. [`escape`](crate::escape()): storage-safety escaping
//!
//! Running the pipeline on its own output is a no-op.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::escape::escape;

/// Code point ranges rewritten to numeric character references by stage 1.
const ENTITY_RANGES: &[(u32, u32)] = &[(0x80, 0x10_FFFF)];

const DEFAULT_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "dd", "div", "dl", "dt", "em", "h1", "h2",
    "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p", "pre", "s", "small", "span",
    "strong", "sub", "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
];

const DEFAULT_ATTRIBUTES: &[&str] = &["href", "src", "title", "alt"];

const DEFAULT_BLOCKED_SCHEMES: &[&str] = &["javascript:"];

static DEFAULT_POLICY: LazyLock<HtmlPolicy> = LazyLock::new(HtmlPolicy::default);

/// Allow-lists consulted by the tag and attribute stages.
///
/// A policy is an immutable value: build it once at startup (or use
/// [`HtmlPolicy::global`]) and share it by reference.
///
/// # Examples
///
/// ```
/// use safely::HtmlPolicy;
///
/// let policy = HtmlPolicy::new(["p", "a"], ["href"]);
/// assert!(policy.allows_element("P"));
/// assert!(!policy.allows_element("script"));
/// assert!(policy.allows_attribute("href"));
/// assert!(!policy.allows_attribute("onclick"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlPolicy {
    elements: BTreeSet<String>,
    attributes: BTreeSet<String>,
    blocked_schemes: Vec<String>,
}

impl Default for HtmlPolicy {
    fn default() -> Self {
        Self {
            elements: DEFAULT_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            attributes: DEFAULT_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            blocked_schemes: DEFAULT_BLOCKED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl HtmlPolicy {
    /// Creates a policy with the given element and attribute allow-lists.
    ///
    /// The blocked scheme list starts as the default (`javascript:`).
    pub fn new<E, A>(elements: E, attributes: A) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            elements: elements.into_iter().map(Into::into).collect(),
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds a scheme prefix (e.g. `"vbscript:"`) whose presence in an
    /// attribute value causes that attribute to be dropped.
    pub fn with_blocked_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.blocked_schemes.push(scheme.into());
        self
    }

    /// The process-wide default policy.
    pub fn global() -> &'static HtmlPolicy {
        &DEFAULT_POLICY
    }

    /// Returns true if `name` is an allow-listed element (case-insensitive).
    pub fn allows_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// Returns true if `name` is an allow-listed attribute (case-insensitive).
    pub fn allows_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Returns true if the attribute value carries a blocked scheme.
    ///
    /// Numeric character references are decoded and ASCII whitespace and
    /// control characters removed before the case-insensitive search, so
    /// `java&#115;cript:` and `java\tscript:` are caught as well.
    pub fn blocks_value(&self, value: &str) -> bool {
        let normalized: String = decode_numeric_entities(value)
            .chars()
            .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
            .collect::<String>()
            .to_ascii_lowercase();
        self.blocked_schemes
            .iter()
            .any(|scheme| normalized.contains(&scheme.to_ascii_lowercase()))
    }
}

/// Runs the full pipeline against the process-wide default policy.
///
/// # Examples
///
/// ```
/// use safely::sanitize_html;
///
/// let out = sanitize_html(r#"<a href="javascript:alert(1)">x</a><script>bad()</script>"#);
/// assert!(!out.contains("javascript:"));
/// assert!(!out.contains("<script>"));
/// assert_eq!(sanitize_html(&out), out);
/// ```
pub fn sanitize_html(input: &str) -> String {
    sanitize_html_with(input, HtmlPolicy::global())
}

/// Runs the full pipeline against `policy`.
pub fn sanitize_html_with(input: &str, policy: &HtmlPolicy) -> String {
    let encoded = encode_entities(input);
    let tags = filter_tags(&encoded, policy);
    let attrs = filter_attributes(&tags, policy);
    let quoted = escape_text_quotes(&attrs);
    escape(&quoted)
}

/// Stage 1: rewrites every code point in the entity range table as `&#NNN;`.
///
/// ASCII (including existing entity text) passes through unchanged.
pub fn encode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let cp = c as u32;
        if ENTITY_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp)) {
            out.push_str(&format!("&#{};", cp));
        } else {
            out.push(c);
        }
    }
    out
}

/// Stage 2: removes every tag whose element is not allow-listed.
///
/// Allowed tags are kept verbatim. Comments, declarations and processing
/// instructions are removed. A `<` that does not begin a complete tag is
/// written as `&lt;`, so removing one tag can never splice together another.
pub fn filter_tags(input: &str, policy: &HtmlPolicy) -> String {
    let mut out = String::with_capacity(input.len());
    for token in Tokens::new(input) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Tag(tag) if policy.allows_element(tag.name) => out.push_str(tag.raw),
            Token::Tag(_) | Token::Declaration(_) => {}
            Token::StrayLt => out.push_str("&lt;"),
        }
    }
    out
}

/// Stage 3: rebuilds each tag keeping only allow-listed, quoted attributes
/// whose value carries no blocked scheme.
///
/// A `javascript:` URI drops just that attribute, not the tag.
pub fn filter_attributes(input: &str, policy: &HtmlPolicy) -> String {
    let mut out = String::with_capacity(input.len());
    for token in Tokens::new(input) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Declaration(raw) => out.push_str(raw),
            Token::StrayLt => out.push('<'),
            Token::Tag(tag) if tag.closing => {
                out.push_str("</");
                out.push_str(tag.name);
                out.push('>');
            }
            Token::Tag(tag) => {
                out.push('<');
                out.push_str(tag.name);
                for (name, value) in parse_attributes(tag.body) {
                    if !policy.allows_attribute(&name) {
                        continue;
                    }
                    if policy.blocks_value(&value) {
                        tracing::debug!(attribute = %name, "dropping attribute with blocked scheme");
                        continue;
                    }
                    push_attribute(&mut out, &name, &value);
                }
                if tag.body.trim_end().ends_with('/') {
                    out.push_str(" /");
                }
                out.push('>');
            }
        }
    }
    out
}

/// Scanner state for [`escape_text_quotes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    /// Character data between tags
    InText,
    /// Between a `<` and the next `>`
    InTag,
}

impl QuoteState {
    fn next(self, c: char) -> Self {
        match (self, c) {
            (QuoteState::InText, '<') => QuoteState::InTag,
            (QuoteState::InTag, '>') => QuoteState::InText,
            (state, _) => state,
        }
    }
}

/// Stage 4: rewrites `"` and `'` in character data as `&quot;` / `&apos;`.
///
/// Quotes inside tag markup are left alone so attribute syntax survives.
pub fn escape_text_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = QuoteState::InText;
    for c in input.chars() {
        state = state.next(c);
        match (state, c) {
            (QuoteState::InText, '"') => out.push_str("&quot;"),
            (QuoteState::InText, '\'') => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Removes all markup, keeping only character data.
///
/// Repeats until nothing more is removed, so input such as
/// `<<b>script>` cannot reassemble a tag.
pub fn strip_tags(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut out = String::with_capacity(current.len());
        for token in Tokens::new(&current) {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::StrayLt => out.push('<'),
                Token::Tag(_) | Token::Declaration(_) => {}
            }
        }
        if out == current {
            return out;
        }
        current = out;
    }
}

/// Returns true if the input contains at least one element tag.
pub(crate) fn contains_tag(input: &str) -> bool {
    Tokens::new(input).any(|t| matches!(t, Token::Tag(_)))
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push('=');
    if !value.contains('"') {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else if !value.contains('\'') {
        out.push('\'');
        out.push_str(value);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
}

/// Extracts `name="value"` / `name='value'` pairs from a tag body.
///
/// A delimiter may also appear backslash-escaped (`name=\"value\"`), which is
/// how attributes look after storage escaping. Unquoted values and bare
/// attribute names are skipped. Parsing stops at an unterminated value.
fn parse_attributes(body: &str) -> Vec<(String, String)> {
    let bytes = body.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
            i += 1;
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_byte(bytes[i]) {
            i += 1;
        }
        if i == name_start {
            // junk byte; step over the whole character
            i += body[i..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let name = &body[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let delimiter = match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'"'), _) => "\"",
            (Some(b'\''), _) => "'",
            (Some(b'\\'), Some(b'"')) => "\\\"",
            (Some(b'\\'), Some(b'\'')) => "\\'",
            _ => {
                // unquoted value: skip it
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                continue;
            }
        };
        let value_start = i + delimiter.len();
        let Some(len) = body[value_start..].find(delimiter) else {
            break;
        };
        attrs.push((
            name.to_ascii_lowercase(),
            body[value_start..value_start + len].to_string(),
        ));
        i = value_start + len + delimiter.len();
    }
    attrs
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Decodes `&#NNN;` and `&#xHH;` references (semicolon optional).
fn decode_numeric_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("&#") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let (hex, digits_at) = match after.as_bytes().first() {
            Some(b'x') | Some(b'X') => (true, 1),
            _ => (false, 0),
        };
        let digits: &str = {
            let tail = &after[digits_at..];
            let n = tail
                .bytes()
                .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                .count();
            &tail[..n]
        };
        let radix = if hex { 16 } else { 10 };
        match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
            Some(c) if !digits.is_empty() => {
                out.push(c);
                let mut consumed = 2 + digits_at + digits.len();
                if rest[start + consumed..].starts_with(';') {
                    consumed += 1;
                }
                rest = &rest[start + consumed..];
            }
            _ => {
                out.push_str("&#");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// One element tag, `<name body>` or `</name body>`.
#[derive(Debug, Clone, Copy)]
struct Tag<'a> {
    raw: &'a str,
    name: &'a str,
    body: &'a str,
    closing: bool,
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
    /// `<!-- -->`, `<!DOCTYPE>`, `<?pi?>`
    Declaration(&'a str),
    /// A `<` that does not begin complete markup
    StrayLt,
}

/// Splits HTML into character data and markup. A tag runs from `<` to the
/// first following `>`.
struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        let rest = &src[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            return Some(Token::Text(&rest[..end]));
        }
        let (token, len) = scan_markup(rest);
        self.pos += len;
        Some(token)
    }
}

fn scan_markup(rest: &str) -> (Token<'_>, usize) {
    if let Some(after) = rest.strip_prefix("<!--") {
        return match after.find("-->") {
            Some(end) => {
                let len = 4 + end + 3;
                (Token::Declaration(&rest[..len]), len)
            }
            None => (Token::StrayLt, 1),
        };
    }

    let bytes = rest.as_bytes();
    match bytes.get(1) {
        Some(b'!') | Some(b'?') => match rest[2..].find('>') {
            Some(end) => {
                let len = 2 + end + 1;
                (Token::Declaration(&rest[..len]), len)
            }
            None => (Token::StrayLt, 1),
        },
        Some(b'/') if bytes.get(2).is_some_and(u8::is_ascii_alphabetic) => scan_tag(rest, 2, true),
        Some(b) if b.is_ascii_alphabetic() => scan_tag(rest, 1, false),
        _ => (Token::StrayLt, 1),
    }
}

fn scan_tag(rest: &str, name_start: usize, closing: bool) -> (Token<'_>, usize) {
    let name_len = rest.as_bytes()[name_start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let name_end = name_start + name_len;
    match rest[name_end..].find('>') {
        Some(offset) => {
            let close = name_end + offset;
            let tag = Tag {
                raw: &rest[..=close],
                name: &rest[name_start..name_end],
                body: &rest[name_end..close],
                closing,
            };
            (Token::Tag(tag), close + 1)
        }
        None => (Token::StrayLt, 1),
    }
}
