//! Validation maps and the allow-list applier.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::coerce::{Coercer, SanitizedValue};
use crate::{Error, Format, RawInputs, RawValue};

/// Field name → required format.
///
/// Only the fields named here ever reach a [`SanitizedMap`].
///
/// # Examples
///
/// ```
/// use safely::{Format, ValidationMap};
///
/// let map = ValidationMap::new()
///     .with("id", "integer")
///     .with("phone", r"\(\d{3}\)\d{3}-\d{4}");
///
/// assert_eq!(map.get("id"), Some(&Format::Integer));
/// assert!(matches!(map.get("phone"), Some(Format::Pattern(_))));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationMap {
    fields: BTreeMap<String, Format>,
}

impl ValidationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field.
    pub fn insert(&mut self, field: impl Into<String>, format: impl Into<Format>) {
        self.fields.insert(field.into(), format.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, field: impl Into<String>, format: impl Into<Format>) -> Self {
        self.insert(field, format);
        self
    }

    /// Loads a map from a JSON object of field → format name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload is not an object whose values
    /// are all strings.
    pub fn from_json(payload: &str) -> Result<Self, Error> {
        let names: BTreeMap<String, String> = serde_json::from_str(payload)?;
        Ok(names
            .into_iter()
            .map(|(field, name)| (field, Format::parse(&name)))
            .collect())
    }

    /// The format for `field`, if named.
    pub fn get(&self, field: &str) -> Option<&Format> {
        self.fields.get(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is named.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Format)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, F: Into<Format>> FromIterator<(K, F)> for ValidationMap {
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, format) in iter {
            map.insert(field, format);
        }
        map
    }
}

/// How field names are sanitized before lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// `[A-Za-z0-9_]`: form fields, server metadata, JSON members
    #[default]
    Varname,
    /// `[A-Za-z0-9_-]`: query parameters
    VarnameDash,
}

impl KeyFormat {
    fn format(self) -> Format {
        match self {
            KeyFormat::Varname => Format::Varname,
            KeyFormat::VarnameDash => Format::VarnameDash,
        }
    }
}

/// Sanitized field name → coerced value.
///
/// A field whose raw value failed its format is present and holds
/// [`SanitizedValue::Rejected`]; a field the request never sent is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedMap {
    fields: BTreeMap<String, SanitizedValue>,
}

impl SanitizedMap {
    /// The value for `field`, if it was present in the input.
    pub fn get(&self, field: &str) -> Option<&SanitizedValue> {
        self.fields.get(field)
    }

    /// Returns true if `field` was present in the input.
    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields written.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SanitizedValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of fields that were present but rejected.
    pub fn rejected(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, value)| value.is_rejected())
            .map(|(field, _)| field)
    }
}

impl IntoIterator for SanitizedMap {
    type Item = (String, SanitizedValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, SanitizedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Applies `map` to `inputs` with the default coercer.
///
/// Iterates the map, never the inputs: a raw field the map does not name is
/// never copied. Each map key is first sanitized with `keys`; the sanitized
/// name is used both to look up the raw value and to write the result.
///
/// # Examples
///
/// ```
/// use safely::{apply, KeyFormat, RawInputs, SanitizedValue, ValidationMap};
///
/// let inputs = RawInputs::from_query("id=42&admin=true&age=old");
/// let map = ValidationMap::new()
///     .with("id", "integer")
///     .with("age", "integer")
///     .with("name", "text");
///
/// let out = apply(&inputs, &map, KeyFormat::VarnameDash);
///
/// assert_eq!(out.get("id"), Some(&SanitizedValue::Integer(42)));
/// assert_eq!(out.get("age"), Some(&SanitizedValue::Rejected));
/// assert!(!out.contains_key("name"));  // never sent
/// assert!(!out.contains_key("admin")); // not in the map
/// ```
pub fn apply(inputs: &RawInputs, map: &ValidationMap, keys: KeyFormat) -> SanitizedMap {
    apply_with(inputs, map, keys, &Coercer::default())
}

/// Like [`apply`], coercing with `coercer` (custom HTML policy, diagnostics).
pub fn apply_with(
    inputs: &RawInputs,
    map: &ValidationMap,
    keys: KeyFormat,
    coercer: &Coercer<'_>,
) -> SanitizedMap {
    let key_format = keys.format();
    let mut out = SanitizedMap::default();

    for (field, format) in map.iter() {
        let SanitizedValue::Text(key) = coercer.make_as(&RawValue::from(field), &key_format)
        else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let Some(raw) = inputs.get(&key) else {
            continue;
        };

        let value = coercer.make_as(raw.as_inner(), format);
        coercer
            .diagnostics()
            .field_coerced(&key, format.name(), value.is_rejected());
        out.fields.insert(key, value);
    }

    tracing::trace!(
        request_id = coercer.diagnostics().request_id().unwrap_or("-"),
        requested = map.len(),
        written = out.len(),
        "validation map applied"
    );
    out
}
