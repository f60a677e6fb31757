//! Format identifiers.
//!
//! A [`Format`] names the coercion rule applied to one field. Names are
//! matched case-insensitively; any other string becomes an anchored
//! [`Pattern`], compiled once when the format is parsed.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// A coercion/validation rule for one field.
#[derive(Debug, Clone)]
pub enum Format {
    /// Whole-number string, round-trip exact
    Integer,
    /// Decimal string, round-trip exact
    Float,
    /// `"true"`/`"1"` are true; everything else is false
    Boolean,
    /// Keeps `[A-Za-z0-9_]`
    Varname,
    /// Keeps `[A-Za-z0-9_-]`
    VarnameDash,
    /// Comma-separated varnames
    VarnameList,
    /// Full HTML sanitization pipeline
    Html,
    /// Markup stripped, then storage-escaped
    Text,
    /// Absolute URL with an allow-listed scheme
    Url,
    /// RFC-shaped mailbox
    Email,
    /// Relative path without `..`
    Filename,
    /// Sequence of text values
    ArrayText,
    /// Sequence filtered to integers
    ArrayIntegers,
    /// Any other identifier: an anchored regular expression
    Pattern(Pattern),
}

impl Format {
    /// Parses a format identifier. Never fails: unknown names become patterns.
    ///
    /// # Examples
    ///
    /// ```
    /// use safely::Format;
    ///
    /// assert!(matches!(Format::parse("Integer"), Format::Integer));
    /// assert!(matches!(Format::parse("ARRAY_INTEGERS"), Format::ArrayIntegers));
    /// assert!(matches!(Format::parse(r"\d{3}"), Format::Pattern(_)));
    /// ```
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "integer" => Format::Integer,
            "float" => Format::Float,
            "boolean" => Format::Boolean,
            "varname" => Format::Varname,
            "varname_dash" => Format::VarnameDash,
            "varname_list" => Format::VarnameList,
            "html" => Format::Html,
            "text" => Format::Text,
            "url" => Format::Url,
            "email" => Format::Email,
            "filename" => Format::Filename,
            "array_text" => Format::ArrayText,
            "array_integers" => Format::ArrayIntegers,
            _ => Format::Pattern(Pattern::new(name)),
        }
    }

    /// The canonical identifier (the pattern source for [`Format::Pattern`]).
    pub fn name(&self) -> &str {
        match self {
            Format::Integer => "integer",
            Format::Float => "float",
            Format::Boolean => "boolean",
            Format::Varname => "varname",
            Format::VarnameDash => "varname_dash",
            Format::VarnameList => "varname_list",
            Format::Html => "html",
            Format::Text => "text",
            Format::Url => "url",
            Format::Email => "email",
            Format::Filename => "filename",
            Format::ArrayText => "array_text",
            Format::ArrayIntegers => "array_integers",
            Format::Pattern(p) => p.source(),
        }
    }
}

impl FromStr for Format {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Format::parse(s))
    }
}

impl From<&str> for Format {
    fn from(s: &str) -> Self {
        Format::parse(s)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Format::Pattern(a), Format::Pattern(b)) => a.source() == b.source(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

/// A regular expression matched against the whole value.
///
/// The source is wrapped as `^(?:source)$`. A source that fails to compile
/// is kept; it simply matches nothing.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Option<Regex>,
}

impl Pattern {
    /// Compiles `source` as an anchored expression.
    ///
    /// `source` must compile on its own before it is wrapped; otherwise an
    /// unbalanced group such as `a)|(b` would close the anchoring group early.
    pub fn new(source: &str) -> Self {
        let compiled =
            Regex::new(source).and_then(|_| Regex::new(&format!("^(?:{})$", source)));
        let regex = match compiled {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = %source, error = %e, "pattern does not compile; it will reject every value");
                None
            }
        };
        Self {
            source: source.to_string(),
            regex,
        }
    }

    /// The pattern as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Returns true if the whole of `value` matches.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(value))
    }
}
