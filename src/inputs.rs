//! Untrusted input shapes.
//!
//! Every value that crosses the request boundary becomes a [`RawValue`]
//! wrapped in [`Tainted`], collected into a flat [`RawInputs`] mapping.

use std::collections::HashMap;

use serde_json::Value;

use crate::{Error, Tainted};

/// Untyped external input: one string, or an ordered sequence of strings
/// (multi-select controls, `name[]` query keys, JSON arrays).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A single string value
    Single(String),
    /// A multi-valued field, in submission order
    Multi(Vec<String>),
}

impl RawValue {
    /// Returns the string when the value is single-valued.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s),
            RawValue::Multi(_) => None,
        }
    }

    /// Returns the elements when the value is multi-valued.
    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            RawValue::Single(_) => None,
            RawValue::Multi(items) => Some(items),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Single(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Single(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::Multi(items)
    }
}

impl From<&[&str]> for RawValue {
    fn from(items: &[&str]) -> Self {
        RawValue::Multi(items.iter().map(|s| s.to_string()).collect())
    }
}

/// A flat, string-keyed mapping of tainted values.
///
/// Raw values can be inserted but never read back out: the only consumer is
/// [`apply`](crate::apply), which copies through just the fields a
/// [`ValidationMap`](crate::ValidationMap) names.
///
/// # Examples
///
/// ```
/// use safely::RawInputs;
///
/// let inputs = RawInputs::from_query("name=Ada&tags[]=a&tags[]=b");
/// assert!(inputs.contains_key("name"));
/// assert!(inputs.contains_key("tags"));
/// assert_eq!(inputs.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    fields: HashMap<String, Tainted<RawValue>>,
}

impl RawInputs {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields
            .insert(key.into(), Tainted::new(value.into()));
    }

    /// Appends to a multi-valued field, converting a single value in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        let merged = match self.fields.remove(&key) {
            Some(existing) => match existing.as_inner() {
                RawValue::Multi(items) => {
                    let mut items = items.clone();
                    items.push(value);
                    items
                }
                RawValue::Single(s) => vec![s.clone(), value],
            },
            None => vec![value],
        };
        self.fields.insert(key, Tainted::new(RawValue::Multi(merged)));
    }

    /// Builds a mapping from key/value pairs; later keys replace earlier ones.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut inputs = Self::new();
        for (k, v) in pairs {
            inputs.insert(k, v);
        }
        inputs
    }

    /// Decodes an `application/x-www-form-urlencoded` string.
    ///
    /// Keys ending in `[]` accumulate into a multi-valued field under the
    /// bare name; a repeated plain key keeps its last value.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut inputs = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.strip_suffix("[]") {
                Some(bare) => inputs.push(bare, value.into_owned()),
                None => inputs.insert(key.to_string(), value.into_owned()),
            }
        }
        inputs
    }

    /// Decodes a form body received as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] when the body is not valid UTF-8. The body
    /// must then be discarded; guessing an encoding for security-relevant
    /// text is not an option.
    pub fn from_form_bytes(body: &[u8]) -> Result<Self, Error> {
        let text = crate::escape::detect_utf8(body)?;
        Ok(Self::from_query(text))
    }

    /// Decodes a JSON object into the flat mapping shape.
    ///
    /// Strings are taken as-is, numbers and booleans by their JSON text,
    /// arrays of scalars become multi-valued fields. `null` members and
    /// nested objects are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload is not valid JSON or its top
    /// level is not an object.
    pub fn from_json(payload: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(payload)?;
        let Value::Object(members) = value else {
            return Err(Error::Json {
                message: "top-level value must be an object".to_string(),
            });
        };

        let mut inputs = Self::new();
        for (key, member) in members {
            match member {
                Value::Array(items) => {
                    let items: Vec<String> = items.iter().filter_map(scalar_text).collect();
                    inputs.insert(key, RawValue::Multi(items));
                }
                other => match scalar_text(&other) {
                    Some(text) => inputs.insert(key, text),
                    None => tracing::trace!(field = %key, "skipping non-scalar JSON member"),
                },
            }
        }
        Ok(inputs)
    }

    /// Returns true if a field with this exact key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Tainted<RawValue>> {
        self.fields.get(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Tainted<RawValue>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
