use std::fmt;

/// A wrapper for untrusted data that must go through a validation map before use.
///
/// `Tainted<T>` marks values that arrived from outside the process (query
/// parameters, form fields, request metadata, JSON bodies). The wrapped value
/// cannot be read by code outside this crate: the only way to get a usable
/// value out is to name the field in a [`ValidationMap`](crate::ValidationMap)
/// and let [`apply`](crate::apply) coerce it.
///
/// # Security Properties
///
/// - Does NOT implement `Deref` or any implicit conversion traits
/// - Inner value is inaccessible outside the crate
/// - The engine only ever borrows the value; it is never mutated
///
/// # Examples
///
/// ```
/// use safely::{RawValue, Tainted};
///
/// let user_input = Tainted::new(RawValue::from("'; DROP TABLE users; --"));
///
/// // Debug output shows it's tainted (for development)
/// println!("{:?}", user_input);
///
/// // But you CANNOT use the value directly:
/// // let query = format!("SELECT * FROM t WHERE name = '{}'", user_input); // Won't compile!
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Tainted<T> {
    // Must stay private; a public field bypasses the validation map entirely.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value in `Tainted`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the inner value for coercion.
    ///
    /// Only the coercion path inside this crate may look at the raw value.
    pub(crate) fn as_inner(&self) -> &T {
        &self.inner
    }
}

// Do NOT add Deref, AsRef, Borrow or Into<T> to Tainted<T>: any of them lets
// raw input reach a sink without passing through a validation map.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
