//! Per-source sanitization entry points.
//!
//! Each function takes the request's [`RequestInputs`], a validation map
//! (or `None` to infer one from the source itself) and a verbose flag, and
//! returns the allow-listed [`SanitizedMap`] for that source.
//!
//! # Integration Flow
//!
//! ```text
//! HTTP Request
//!   ↓
//! Framework-specific code builds RequestAdapter
//!   ↓
//! extract_raw_inputs() → RequestInputs (all tainted)
//!   ↓
//! safe_get / safe_post / safe_server / safe_json with a ValidationMap
//!   ↓
//! SanitizedMap: only named fields, coerced or Rejected
//! ```

use crate::apply::apply_with;
use crate::logging::Diagnostics;
use crate::{default_validation_map, Coercer, KeyFormat, RawInputs, SanitizedMap, ValidationMap};

use super::RequestInputs;

/// Where a set of inputs came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// URL query parameters
    Query,
    /// Form body fields
    Form,
    /// Server/request metadata
    Server,
    /// JSON body members
    Json,
}

impl Source {
    /// How field names from this source are sanitized.
    ///
    /// Query keys keep dashes (REST-style names such as `first-name`); every
    /// other source is restricted to `[A-Za-z0-9_]`.
    pub fn key_format(self) -> KeyFormat {
        match self {
            Source::Query => KeyFormat::VarnameDash,
            Source::Form | Source::Server | Source::Json => KeyFormat::Varname,
        }
    }

    fn select(self, inputs: &RequestInputs) -> &RawInputs {
        match self {
            Source::Query => inputs.query(),
            Source::Form => inputs.form(),
            Source::Server => inputs.server(),
            Source::Json => inputs.json(),
        }
    }
}

/// Sanitizes query parameters.
///
/// # Examples
///
/// ```
/// use safely::web::{safe_get, RequestAdapter, ExtractRawInputs};
/// use safely::{SanitizedValue, ValidationMap};
///
/// let mut adapter = RequestAdapter::new("req-get".to_string());
/// adapter.set_query_string("one=1&two=This+is+a+%3Cb%3Ehtml%3C%2Fb%3E.");
///
/// let map = ValidationMap::new().with("one", "integer").with("two", "text");
/// let out = safe_get(&adapter.extract_raw_inputs(), Some(&map), false);
///
/// assert_eq!(out.get("one"), Some(&SanitizedValue::Integer(1)));
/// assert_eq!(out.get("two"), Some(&SanitizedValue::Text("This is a html.".into())));
/// ```
pub fn safe_get(inputs: &RequestInputs, map: Option<&ValidationMap>, verbose: bool) -> SanitizedMap {
    sanitize_source(inputs, Source::Query, map, &Coercer::default().verbose(verbose))
}

/// Sanitizes form fields.
pub fn safe_post(inputs: &RequestInputs, map: Option<&ValidationMap>, verbose: bool) -> SanitizedMap {
    sanitize_source(inputs, Source::Form, map, &Coercer::default().verbose(verbose))
}

/// Sanitizes server metadata such as `PATH_INFO`.
pub fn safe_server(
    inputs: &RequestInputs,
    map: Option<&ValidationMap>,
    verbose: bool,
) -> SanitizedMap {
    sanitize_source(inputs, Source::Server, map, &Coercer::default().verbose(verbose))
}

/// Sanitizes the members of a JSON body.
pub fn safe_json(inputs: &RequestInputs, map: Option<&ValidationMap>, verbose: bool) -> SanitizedMap {
    sanitize_source(inputs, Source::Json, map, &Coercer::default().verbose(verbose))
}

/// Sanitizes one source with a caller-configured coercer.
///
/// The request ID of `inputs` is bound to the coercer's diagnostics. With
/// `map` set to `None` the map is inferred from the source's own values,
/// which admits every field it contains; pass an explicit map wherever the
/// expected fields are known.
pub fn sanitize_source(
    inputs: &RequestInputs,
    source: Source,
    map: Option<&ValidationMap>,
    coercer: &Coercer<'_>,
) -> SanitizedMap {
    let raw = source.select(inputs);
    let diagnostics = Diagnostics::new(coercer.diagnostics().is_verbose())
        .with_request_id(inputs.request_id());
    let coercer = Coercer::with_policy(coercer.policy()).with_diagnostics(diagnostics);

    match map {
        Some(map) => apply_with(raw, map, source.key_format(), &coercer),
        None => {
            tracing::debug!(
                request_id = inputs.request_id(),
                source = ?source,
                "no validation map supplied; inferring one"
            );
            let inferred = default_validation_map(raw);
            apply_with(raw, &inferred, source.key_format(), &coercer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{ExtractRawInputs, RequestAdapter};
    use crate::{HtmlPolicy, SanitizedValue};

    fn inputs() -> RequestInputs {
        let mut adapter = RequestAdapter::new("req-mw".to_string());
        adapter.set_query_string("first-name=Ada&id=3&extra=1");
        adapter.add_form_field("first-name", "Bob");
        adapter.add_server_var("PATH_INFO", "/20241/54321");
        adapter
            .set_json_body(r#"{"id": 9, "bio": "<b>hi</b><i>x</i>"}"#)
            .expect("object");
        adapter.extract_raw_inputs()
    }

    #[test]
    fn query_keys_keep_dashes() {
        let map = ValidationMap::new().with("first-name", "text");
        let out = safe_get(&inputs(), Some(&map), false);
        assert_eq!(out.get("first-name"), Some(&SanitizedValue::Text("Ada".into())));
    }

    #[test]
    fn form_keys_drop_dashes() {
        let map = ValidationMap::new().with("first-name", "text");
        let out = safe_post(&inputs(), Some(&map), false);
        // "firstname" was never posted
        assert!(out.is_empty());
    }

    #[test]
    fn server_path_info_by_pattern() {
        let ok = ValidationMap::new().with("PATH_INFO", "/20[0-9][0-9][1-3]/[0-9]{5}");
        let out = safe_server(&inputs(), Some(&ok), true);
        assert_eq!(
            out.get("PATH_INFO"),
            Some(&SanitizedValue::Text("/20241/54321".into()))
        );

        let strict = ValidationMap::new().with("PATH_INFO", "/20[0-9][0-9][1-3]/[0-9]{4}");
        let out = safe_server(&inputs(), Some(&strict), false);
        assert_eq!(out.get("PATH_INFO"), Some(&SanitizedValue::Rejected));
    }

    #[test]
    fn json_members_are_coerced() {
        let map = ValidationMap::new().with("id", "integer");
        let out = safe_json(&inputs(), Some(&map), false);
        assert_eq!(out.get("id"), Some(&SanitizedValue::Integer(9)));
        assert!(!out.contains_key("bio"));
    }

    #[test]
    fn missing_map_is_inferred_from_the_source() {
        let out = safe_get(&inputs(), None, false);
        assert_eq!(out.get("id"), Some(&SanitizedValue::Integer(3)));
        assert_eq!(out.get("extra"), Some(&SanitizedValue::Integer(1)));
        assert_eq!(out.get("first-name"), Some(&SanitizedValue::Text("Ada".into())));
    }

    #[test]
    fn custom_policy_flows_through() {
        let policy = HtmlPolicy::new(["i"], Vec::<String>::new());
        let coercer = Coercer::with_policy(&policy);
        let map = ValidationMap::new().with("bio", "html");

        let out = sanitize_source(&inputs(), Source::Json, Some(&map), &coercer);
        assert_eq!(out.get("bio"), Some(&SanitizedValue::Text("hi<i>x</i>".into())));
    }

    #[test]
    fn key_formats_per_source() {
        assert_eq!(Source::Query.key_format(), KeyFormat::VarnameDash);
        assert_eq!(Source::Form.key_format(), KeyFormat::Varname);
        assert_eq!(Source::Server.key_format(), KeyFormat::Varname);
        assert_eq!(Source::Json.key_format(), KeyFormat::Varname);
    }
}
