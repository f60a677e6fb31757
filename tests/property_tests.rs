//! Integration property tests for safely.
//!
//! These tests validate cross-module invariants: pipeline idempotence, the
//! allow-list property of the applier, and the format guarantees that callers
//! rely on.

use safely::{
    apply, escape, is_valid_filename, make_as, sanitize_html, strip_tags, Format, KeyFormat,
    RawInputs, RawValue, SanitizedValue, ValidationMap,
};
use proptest::prelude::*;
use regex::Regex;

// Strategy: markup-heavy strings that exercise every pipeline stage
fn arb_markup() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("<".to_string()),
            Just(">".to_string()),
            Just("\"".to_string()),
            Just("'".to_string()),
            Just("\\".to_string()),
            Just("<b>".to_string()),
            Just("</b>".to_string()),
            Just("<script>".to_string()),
            Just("<a href=\"".to_string()),
            Just("javascript:".to_string()),
            Just(" title='".to_string()),
            Just("<!--".to_string()),
            Just("-->".to_string()),
            Just("&#106;".to_string()),
            Just("\u{e9}".to_string()),
            prop::string::string_regex("[a-z =/]{0,6}").unwrap(),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

// Strategy: field names that survive varname sanitization unchanged
fn arb_field() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,8}").unwrap()
}

// Strategy: format names, including a pattern
fn arb_format() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("integer"),
        Just("float"),
        Just("boolean"),
        Just("varname"),
        Just("html"),
        Just("text"),
        Just("url"),
        Just("email"),
        Just("filename"),
        Just("[a-z]+"),
    ]
}

// Strategy: pattern sources built from fragments, balanced or not
fn arb_pattern_source() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("[0-9]+".to_string()),
            Just("(".to_string()),
            Just(")".to_string()),
            Just("|".to_string()),
            Just("x".to_string()),
            Just("a*".to_string()),
            Just("<".to_string()),
        ],
        1..8,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    /// Property: the HTML pipeline is idempotent
    #[test]
    fn proptest_sanitize_html_is_idempotent(input in arb_markup()) {
        let once = sanitize_html(&input);
        prop_assert_eq!(sanitize_html(&once), once);
    }

    /// Property: sanitized HTML never carries a live javascript: attribute
    #[test]
    fn proptest_sanitize_html_blocks_javascript_attributes(input in arb_markup()) {
        let out = sanitize_html(&input);
        for tag in out.split('<').skip(1) {
            let inside = tag.split('>').next().unwrap_or("");
            prop_assert!(!inside.to_ascii_lowercase().contains("javascript:"), "{:?}", out);
        }
    }

    /// Property: storage escaping is idempotent
    #[test]
    fn proptest_escape_is_idempotent(input in "[a-z'\"\\\\\n\r\0]{0,32}") {
        let once = escape(&input);
        prop_assert_eq!(escape(&once), once);
    }

    /// Property: strip_tags leaves no complete tag behind
    #[test]
    fn proptest_strip_tags_reaches_fixpoint(input in arb_markup()) {
        let once = strip_tags(&input);
        prop_assert_eq!(strip_tags(&once), once);
    }

    /// Property: output keys are a subset of the validation map's keys
    ///
    /// Extra raw fields never leak, whatever they contain.
    #[test]
    fn proptest_apply_respects_allow_list(
        mapped in prop::collection::btree_map(arb_field(), arb_format(), 0..6),
        raw in prop::collection::btree_map(arb_field(), "[ -~]{0,16}", 0..12),
    ) {
        let inputs = RawInputs::from_pairs(raw.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let map: ValidationMap = mapped.iter().map(|(k, f)| (k.as_str(), *f)).collect();

        let out = apply(&inputs, &map, KeyFormat::Varname);

        for (field, _) in out.iter() {
            prop_assert!(map.get(field).is_some(), "unmapped field {} leaked", field);
            prop_assert!(raw.contains_key(field), "field {} was never sent", field);
        }
        for (field, _) in map.iter() {
            prop_assert_eq!(out.contains_key(field), raw.contains_key(field));
        }
    }

    /// Property: boolean never rejects, for any input shape
    #[test]
    fn proptest_boolean_never_rejects(
        single in ".{0,16}",
        multi in prop::collection::vec(".{0,8}", 0..4),
    ) {
        let expected = single == "true" || single == "1";
        prop_assert_eq!(
            make_as(&RawValue::from(single.as_str()), &Format::Boolean),
            SanitizedValue::Boolean(expected)
        );
        prop_assert_eq!(
            make_as(&RawValue::from(multi), &Format::Boolean),
            SanitizedValue::Boolean(false)
        );
    }

    /// Property: no accepted filename contains a parent-directory step
    #[test]
    fn proptest_filename_rejects_traversal(
        prefix in "[a-z/]{0,8}",
        suffix in "[a-z/.]{0,8}",
    ) {
        let path = format!("{}../{}", prefix, suffix);
        prop_assert!(!is_valid_filename(&path));
    }

    /// Property: integers round-trip exactly
    #[test]
    fn proptest_integer_round_trips(n in any::<i64>()) {
        prop_assert_eq!(
            make_as(&RawValue::from(n.to_string()), &Format::Integer),
            SanitizedValue::Integer(n)
        );
    }

    /// Property: array_integers keeps order and drops non-numeric elements
    #[test]
    fn proptest_array_integers_filters_in_order(
        items in prop::collection::vec(prop_oneof![
            any::<i32>().prop_map(|n| n.to_string()),
            "[a-z ]{1,6}",
        ], 0..10),
    ) {
        let expected: Vec<i64> = items.iter().filter_map(|s| s.parse::<i64>().ok()).collect();
        prop_assert_eq!(
            make_as(&RawValue::from(items), &Format::ArrayIntegers),
            SanitizedValue::IntegerList(expected)
        );
    }

    /// Property: a pattern accepts a value only if the source, compiled on
    /// its own, matches the whole value
    #[test]
    fn proptest_pattern_accepts_only_whole_matches(
        source in arb_pattern_source(),
        value in "[0-9xa<>/()]{0,8}",
    ) {
        let accepted = make_as(&RawValue::from(value.as_str()), &Format::parse(&source));
        if let SanitizedValue::Text(text) = accepted {
            prop_assert_eq!(&text, &value);
            prop_assert!(Regex::new(&source).is_ok(), "{:?} does not compile alone", source);
            let whole = Regex::new(&format!("^(?:{})$", source)).unwrap();
            prop_assert!(whole.is_match(&value), "{:?} accepted {:?}", source, value);
        } else {
            prop_assert!(accepted.is_rejected());
        }
    }
}
