//! Format coercion.
//!
//! [`Coercer::make_as`] turns one raw value into a typed, safe value or the
//! [`SanitizedValue::Rejected`] sentinel. Coercion never fails with an error.

use serde::{Serialize, Serializer};

use crate::escape::escape;
use crate::html::{sanitize_html_with, strip_tags, HtmlPolicy};
use crate::logging::Diagnostics;
use crate::validate::{is_valid_email, is_valid_filename, is_valid_url, lacks_scheme};
use crate::{Format, RawValue};

/// The result of coercing one value.
///
/// `Rejected` is the sentinel for "this value failed its format". No format
/// produces it for accepted input. It serializes as JSON `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizedValue {
    /// From `integer`
    Integer(i64),
    /// From `float`
    Float(f64),
    /// From `boolean`
    Boolean(bool),
    /// From the string-producing formats
    Text(String),
    /// From `array_text`
    TextList(Vec<String>),
    /// From `array_integers`
    IntegerList(Vec<i64>),
    /// The value failed its format
    Rejected,
}

impl SanitizedValue {
    /// Returns true for the rejection sentinel.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SanitizedValue::Rejected)
    }

    /// The string, for string-producing formats.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SanitizedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, for `integer`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SanitizedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The number, for `float` (and `integer`, widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SanitizedValue::Float(f) => Some(*f),
            SanitizedValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The flag, for `boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SanitizedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The elements, for `array_text`.
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            SanitizedValue::TextList(items) => Some(items),
            _ => None,
        }
    }

    /// The elements, for `array_integers`.
    pub fn as_integer_list(&self) -> Option<&[i64]> {
        match self {
            SanitizedValue::IntegerList(items) => Some(items),
            _ => None,
        }
    }
}

impl Serialize for SanitizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SanitizedValue::Integer(i) => serializer.serialize_i64(*i),
            SanitizedValue::Float(f) => serializer.serialize_f64(*f),
            SanitizedValue::Boolean(b) => serializer.serialize_bool(*b),
            SanitizedValue::Text(s) => serializer.serialize_str(s),
            SanitizedValue::TextList(items) => items.serialize(serializer),
            SanitizedValue::IntegerList(items) => items.serialize(serializer),
            SanitizedValue::Rejected => serializer.serialize_bool(false),
        }
    }
}

/// Coerces raw values into [`SanitizedValue`]s.
///
/// A coercer holds only borrowed, immutable configuration, so it is `Copy`
/// and may be shared freely across threads.
///
/// # Examples
///
/// ```
/// use safely::{Coercer, Format, RawValue, SanitizedValue};
///
/// let coercer = Coercer::default();
/// let phone = Format::parse(r"\(\d{3}\)\d{3}-\d{4}");
///
/// assert_eq!(
///     coercer.make_as(&RawValue::from("(213)740-2925"), &phone),
///     SanitizedValue::Text("(213)740-2925".to_string())
/// );
/// assert!(coercer.make_as(&RawValue::from("(213)740-292592"), &phone).is_rejected());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Coercer<'a> {
    policy: &'a HtmlPolicy,
    diagnostics: Diagnostics<'a>,
}

impl Default for Coercer<'static> {
    fn default() -> Self {
        Self {
            policy: HtmlPolicy::global(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl<'a> Coercer<'a> {
    /// Creates a coercer that sanitizes HTML against `policy`.
    pub fn with_policy(policy: &'a HtmlPolicy) -> Self {
        Self {
            policy,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Replaces the diagnostics (verbosity, request ID).
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics<'a>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Turns verbose pattern diagnostics on or off, keeping the request ID.
    pub fn verbose(self, verbose: bool) -> Self {
        let mut diagnostics = Diagnostics::new(verbose);
        if let Some(id) = self.diagnostics.request_id() {
            diagnostics = diagnostics.with_request_id(id);
        }
        self.with_diagnostics(diagnostics)
    }

    /// The HTML policy in use.
    pub fn policy(&self) -> &'a HtmlPolicy {
        self.policy
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics<'a> {
        &self.diagnostics
    }

    /// Coerces `value` according to `format`.
    ///
    /// Scalar formats reject multi-valued input (except `boolean`, which
    /// never rejects); the array formats reject single values.
    pub fn make_as(&self, value: &RawValue, format: &Format) -> SanitizedValue {
        use SanitizedValue::{Rejected, Text};

        let single = value.as_single();
        match format {
            Format::Integer => single.and_then(coerce_integer).unwrap_or(Rejected),
            Format::Float => single.and_then(coerce_float).unwrap_or(Rejected),
            Format::Boolean => SanitizedValue::Boolean(matches!(single, Some("true") | Some("1"))),
            Format::Varname => single.map_or(Rejected, |s| Text(keep_varname(s, false))),
            Format::VarnameDash => single.map_or(Rejected, |s| Text(keep_varname(s, true))),
            Format::VarnameList => single.map_or(Rejected, |s| {
                Text(
                    s.split(',')
                        .map(|part| keep_varname(part, false))
                        .collect::<Vec<_>>()
                        .join(","),
                )
            }),
            Format::Html => single.map_or(Rejected, |s| Text(sanitize_html_with(s, self.policy))),
            Format::Text => single.map_or(Rejected, |s| Text(clean_text(s))),
            Format::Url => single.map_or(Rejected, coerce_url),
            Format::Email => match single {
                Some(s) if is_valid_email(s) => Text(s.to_string()),
                _ => Rejected,
            },
            Format::Filename => match single {
                Some(s) if is_valid_filename(s) => Text(s.to_string()),
                _ => Rejected,
            },
            Format::ArrayText => match value.as_multi() {
                Some(items) => {
                    SanitizedValue::TextList(items.iter().map(|s| clean_text(s)).collect())
                }
                None => Rejected,
            },
            Format::ArrayIntegers => match value.as_multi() {
                Some(items) => SanitizedValue::IntegerList(
                    items.iter().filter_map(|s| parse_numeric(s)).collect(),
                ),
                None => Rejected,
            },
            Format::Pattern(pattern) => match single {
                Some(s) => {
                    let matched = pattern.matches(s);
                    self.diagnostics
                        .pattern_result(s, pattern.source(), matched);
                    if matched {
                        Text(s.to_string())
                    } else {
                        Rejected
                    }
                }
                None => Rejected,
            },
        }
    }
}

/// Coerces `value` with the default HTML policy and no diagnostics.
///
/// # Examples
///
/// ```
/// use safely::{make_as, Format, RawValue, SanitizedValue};
///
/// assert_eq!(make_as(&RawValue::from("1"), &Format::Boolean), SanitizedValue::Boolean(true));
/// assert_eq!(make_as(&RawValue::from("blah"), &Format::Boolean), SanitizedValue::Boolean(false));
///
/// let picks = RawValue::from(&["1", "2", "The Fox"][..]);
/// assert_eq!(make_as(&picks, &Format::ArrayIntegers), SanitizedValue::IntegerList(vec![1, 2]));
/// ```
pub fn make_as(value: &RawValue, format: &Format) -> SanitizedValue {
    Coercer::default().make_as(value, format)
}

fn coerce_integer(s: &str) -> Option<SanitizedValue> {
    s.parse::<i64>()
        .ok()
        .filter(|i| i.to_string() == s)
        .map(SanitizedValue::Integer)
}

fn coerce_float(s: &str) -> Option<SanitizedValue> {
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.to_string() == s)
        .map(SanitizedValue::Float)
}

fn coerce_url(s: &str) -> SanitizedValue {
    if is_valid_url(s) {
        return SanitizedValue::Text(s.to_string());
    }
    if lacks_scheme(s) {
        let assumed = format!("http://{}", s);
        if is_valid_url(&assumed) {
            return SanitizedValue::Text(assumed);
        }
    }
    SanitizedValue::Rejected
}

fn keep_varname(s: &str, allow_dash: bool) -> String {
    s.chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == '_' || (allow_dash && c == '-'))
        .collect()
}

fn clean_text(s: &str) -> String {
    escape(&strip_tags(s))
}

/// Integer value of a numeric string; decimals are truncated toward zero.
///
/// Values outside the `i64` range are not numeric here; a saturating cast
/// would turn `1e300` into `i64::MAX`.
fn parse_numeric(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    s.parse::<f64>()
        .ok()
        .map(f64::trunc)
        .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
        .map(|f| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(format: &str, value: &str) -> SanitizedValue {
        make_as(&RawValue::from(value), &Format::parse(format))
    }

    fn multi(format: &str, values: &[&str]) -> SanitizedValue {
        make_as(&RawValue::from(values), &Format::parse(format))
    }

    #[test]
    fn integer_requires_exact_round_trip() {
        assert_eq!(single("integer", "42"), SanitizedValue::Integer(42));
        assert_eq!(single("integer", "-7"), SanitizedValue::Integer(-7));
        assert!(single("integer", "12abc").is_rejected());
        assert!(single("integer", "007").is_rejected());
        assert!(single("integer", "+5").is_rejected());
        assert!(single("integer", " 5").is_rejected());
        assert!(single("integer", "").is_rejected());
    }

    #[test]
    fn float_requires_exact_round_trip() {
        assert_eq!(single("float", "2.1"), SanitizedValue::Float(2.1));
        assert_eq!(single("float", "3"), SanitizedValue::Float(3.0));
        assert!(single("float", "2.10").is_rejected());
        assert!(single("float", "1e5").is_rejected());
        assert!(single("float", "inf").is_rejected());
        assert!(single("float", "NaN").is_rejected());
        assert!(single("float", "2.1x").is_rejected());
    }

    #[test]
    fn boolean_never_rejects() {
        assert_eq!(single("boolean", "true"), SanitizedValue::Boolean(true));
        assert_eq!(single("boolean", "1"), SanitizedValue::Boolean(true));
        assert_eq!(single("boolean", "false"), SanitizedValue::Boolean(false));
        assert_eq!(single("boolean", "0"), SanitizedValue::Boolean(false));
        assert_eq!(single("boolean", "blahblah"), SanitizedValue::Boolean(false));
        assert_eq!(single("boolean", "TRUE"), SanitizedValue::Boolean(false));
        assert_eq!(multi("boolean", &["true"]), SanitizedValue::Boolean(false));
    }

    #[test]
    fn varname_filters_rather_than_rejects() {
        assert_eq!(single("varname", "one1"), SanitizedValue::Text("one1".into()));
        assert_eq!(
            single("varname", "my-var name!"),
            SanitizedValue::Text("myvarname".into())
        );
        assert_eq!(
            single("varname_dash", "seven-eight; drop"),
            SanitizedValue::Text("seven-eightdrop".into())
        );
        assert!(multi("varname", &["a"]).is_rejected());
    }

    #[test]
    fn varname_list_keeps_shape() {
        assert_eq!(
            single("varname_list", "one,two,three"),
            SanitizedValue::Text("one,two,three".into())
        );
        assert_eq!(
            single("varname_list", "$one,two,$three"),
            SanitizedValue::Text("one,two,three".into())
        );
        assert_eq!(
            single("varname_list", "a,,$$,b"),
            SanitizedValue::Text("a,,,b".into())
        );
    }

    #[test]
    fn html_runs_the_pipeline() {
        let out = single("html", r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!out.as_str().unwrap().contains("javascript:"));

        let out = single("html", r#"<a href="http://example.com">x</a>"#);
        assert!(out.as_str().unwrap().contains("href="));
        assert!(multi("html", &["<b>x</b>"]).is_rejected());
    }

    #[test]
    fn html_uses_the_injected_policy() {
        let policy = HtmlPolicy::new(["em"], ["title"]);
        let coercer = Coercer::with_policy(&policy);
        let out = coercer.make_as(&RawValue::from("<b>bold</b> <em>x</em>"), &Format::Html);
        assert_eq!(out, SanitizedValue::Text("bold <em>x</em>".into()));
    }

    #[test]
    fn text_strips_markup_and_escapes() {
        assert_eq!(
            single("text", "This is a <b>html</b>."),
            SanitizedValue::Text("This is a html.".into())
        );
        assert_eq!(
            single("text", "O'Brien <script>x</script>"),
            SanitizedValue::Text("O\\'Brien x".into())
        );
    }

    #[test]
    fn url_accepts_and_retries_once_with_http() {
        assert_eq!(
            single("url", "http://www.usc.edu"),
            SanitizedValue::Text("http://www.usc.edu".into())
        );
        assert_eq!(
            single("url", "www.usc.edu"),
            SanitizedValue::Text("http://www.usc.edu".into())
        );
        assert!(single("url", "htp://www.usc.edu").is_rejected());
        assert!(single("url", "javascript:alert(1)").is_rejected());
        assert!(single("url", "").is_rejected());
    }

    #[test]
    fn email_and_filename_pass_valid_values_unchanged() {
        assert_eq!(
            single("email", "ttrojan@usc.edu"),
            SanitizedValue::Text("ttrojan@usc.edu".into())
        );
        assert!(single("email", "A@b@c@example.com").is_rejected());
        assert_eq!(
            single("filename", "one/two/three.txt"),
            SanitizedValue::Text("one/two/three.txt".into())
        );
        assert!(single("filename", "../etc/passwd").is_rejected());
    }

    #[test]
    fn array_text_maps_every_element() {
        assert_eq!(
            multi("array_text", &["1", "A <b>Fox</b>", "it's"]),
            SanitizedValue::TextList(vec!["1".into(), "A Fox".into(), "it\\'s".into()])
        );
        assert!(single("array_text", "scalar").is_rejected());
    }

    #[test]
    fn array_integers_drops_non_numeric_elements() {
        assert_eq!(
            multi("array_integers", &["1", "2", "The Fox"]),
            SanitizedValue::IntegerList(vec![1, 2])
        );
        assert_eq!(
            multi("array_integers", &["3.9", "-4", "inf", "0x10"]),
            SanitizedValue::IntegerList(vec![3, -4])
        );
        assert!(single("array_integers", "1").is_rejected());
    }

    #[test]
    fn pattern_fallback_is_anchored() {
        let re = r"\([0-9][0-9][0-9]\)[0-9][0-9][0-9]-[0-9][0-9][0-9][0-9]";
        assert_eq!(
            single(re, "(213)740-2925"),
            SanitizedValue::Text("(213)740-2925".into())
        );
        assert!(single(re, "(213)740-292592").is_rejected());
        assert!(multi(re, &["(213)740-2925"]).is_rejected());
    }

    #[test]
    fn array_integers_drops_out_of_range_elements() {
        assert_eq!(
            multi(
                "array_integers",
                &["1e300", "9999999999999999999", "-1e300", "5", "-9223372036854775808"]
            ),
            SanitizedValue::IntegerList(vec![5, i64::MIN])
        );
    }

    #[test]
    fn invalid_pattern_rejects() {
        assert!(single("([", "([").is_rejected());
    }

    #[test]
    fn unbalanced_pattern_rejects_injected_markup() {
        let value = "123<script>alert(1)</script>";
        assert!(single("[0-9]+)|(x", value).is_rejected());
        assert!(single("[0-9]+)|(x", "123").is_rejected());
    }

    #[test]
    fn verbose_keeps_request_id() {
        let coercer = Coercer::default()
            .with_diagnostics(Diagnostics::new(false).with_request_id("req-9"))
            .verbose(true);
        assert!(coercer.diagnostics().is_verbose());
        assert_eq!(coercer.diagnostics().request_id(), Some("req-9"));
    }

    #[test]
    fn rejected_serializes_as_false() {
        let json = serde_json::to_string(&vec![
            SanitizedValue::Rejected,
            SanitizedValue::Integer(1),
            SanitizedValue::Text("a".into()),
            SanitizedValue::IntegerList(vec![1, 2]),
        ])
        .unwrap();
        assert_eq!(json, r#"[false,1,"a",[1,2]]"#);
    }
}
