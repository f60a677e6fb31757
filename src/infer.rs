//! Format inference for callers that supply no validation map.

use std::sync::LazyLock;

use regex::Regex;

use crate::html::contains_tag;
use crate::validate::{is_valid_email, is_valid_url};
use crate::{Format, RawInputs, RawValue, ValidationMap};

/// Whole numbers.
static RE_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Decimal numbers with a fractional part.
static RE_FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());

static RE_BOOLEAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:true|1|false|0)$").unwrap());

static RE_VARNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Tag-shaped text the tokenizer reads as part of a comment or declaration.
static RE_HTML_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z]+[^>]*>").unwrap());

/// Synthesizes a validation map from the shape of each raw value.
///
/// Single values are tested in a fixed order, first match wins:
/// `integer`, `float`, `boolean`, `varname`, `html`, `url`, `email`, and
/// finally `text`. Numeric and boolean forms come first so that `"42"` is
/// never classified as a varname or free text.
///
/// Multi-valued fields become `array_integers` when every element is a whole
/// number and `array_text` otherwise.
///
/// # Examples
///
/// ```
/// use safely::{default_validation_map, Format, RawInputs};
///
/// let inputs = RawInputs::from_pairs([
///     ("id", "42"),
///     ("ratio", "2.5"),
///     ("page", "home_page"),
///     ("bio", "I <b>love</b> Rust"),
///     ("site", "https://www.rust-lang.org"),
/// ]);
/// let map = default_validation_map(&inputs);
///
/// assert_eq!(map.get("id"), Some(&Format::Integer));
/// assert_eq!(map.get("ratio"), Some(&Format::Float));
/// assert_eq!(map.get("page"), Some(&Format::Varname));
/// assert_eq!(map.get("bio"), Some(&Format::Html));
/// assert_eq!(map.get("site"), Some(&Format::Url));
/// ```
pub fn default_validation_map(inputs: &RawInputs) -> ValidationMap {
    let mut map = ValidationMap::new();
    for (key, value) in inputs.iter() {
        map.insert(key, infer_format(value.as_inner()));
    }
    tracing::trace!(fields = map.len(), "inferred validation map");
    map
}

fn infer_format(value: &RawValue) -> Format {
    match value {
        RawValue::Single(s) => infer_single(s),
        RawValue::Multi(items) => {
            if !items.is_empty() && items.iter().all(|s| RE_INTEGER.is_match(s)) {
                Format::ArrayIntegers
            } else {
                Format::ArrayText
            }
        }
    }
}

fn infer_single(value: &str) -> Format {
    if RE_INTEGER.is_match(value) {
        Format::Integer
    } else if RE_FLOAT.is_match(value) {
        Format::Float
    } else if RE_BOOLEAN.is_match(value) {
        Format::Boolean
    } else if RE_VARNAME.is_match(value) {
        Format::Varname
    } else if contains_tag(value) || RE_HTML_FRAGMENT.is_match(value) {
        Format::Html
    } else if is_valid_url(value) {
        Format::Url
    } else if is_valid_email(value) {
        Format::Email
    } else {
        Format::Text
    }
}
