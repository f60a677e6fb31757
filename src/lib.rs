//! Allow-list sanitization and type coercion for untrusted request input.
//!
//! This crate turns raw request values into typed, safe values through:
//! - **Taint tracking**: every raw value is a [`Tainted<RawValue>`] that code
//!   outside this crate cannot read
//! - **Validation maps**: only fields a [`ValidationMap`] names are ever
//!   copied out, each coerced to its [`Format`]
//! - **HTML sanitization**: an idempotent five-stage pipeline driven by an
//!   immutable [`HtmlPolicy`]
//!
//! Routine rejections are data, not errors: a field that fails its format
//! comes back as [`SanitizedValue::Rejected`].
//!
//! # Core Types
//!
//! - [`RawInputs`]: Flat mapping of tainted request values
//! - [`Format`]: A named coercion rule or an anchored regular expression
//! - [`ValidationMap`]: Field name → format, the allow-list
//! - [`SanitizedMap`]: Result of [`apply`], keyed by sanitized field name
//! - [`Coercer`]: Configured coercion (HTML policy, diagnostics)
//!
//! # Examples
//!
//! ```
//! use safely::{apply, KeyFormat, RawInputs, SanitizedValue, ValidationMap};
//!
//! let inputs = RawInputs::from_query(
//!     "phone=(213)740-2925&bio=%3Ca+href%3D%22javascript%3Aalert(1)%22%3Ex%3C%2Fa%3E&is_admin=1",
//! );
//! let map = ValidationMap::new()
//!     .with("phone", r"\([0-9]{3}\)[0-9]{3}-[0-9]{4}")
//!     .with("bio", "html");
//!
//! let out = apply(&inputs, &map, KeyFormat::VarnameDash);
//!
//! assert_eq!(out.get("phone"), Some(&SanitizedValue::Text("(213)740-2925".into())));
//! assert!(!out.get("bio").unwrap().as_str().unwrap().contains("javascript:"));
//! assert!(!out.contains_key("is_admin"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod apply;
mod coerce;
mod date;
mod error;
mod escape;
mod format;
mod html;
mod infer;
mod inputs;
mod logging;
mod tainted;
mod validate;

pub mod web;

pub use apply::{apply, apply_with, KeyFormat, SanitizedMap, ValidationMap};
pub use coerce::{make_as, Coercer, SanitizedValue};
pub use date::safe_str_to_time;
pub use error::Error;
pub use escape::{escape, escape_bytes};
pub use format::{Format, Pattern};
pub use html::{
    encode_entities, escape_text_quotes, filter_attributes, filter_tags, sanitize_html,
    sanitize_html_with, strip_tags, HtmlPolicy,
};
pub use infer::default_validation_map;
pub use inputs::{RawInputs, RawValue};
pub use logging::Diagnostics;
pub use tainted::Tainted;
pub use validate::{
    is_valid_email, is_valid_filename, is_valid_url, is_valid_url_with, DEFAULT_URL_SCHEMES,
    MAX_FILENAME_CHARS,
};
