/// Diagnostic logging for coercion.
///
/// Values are untrusted and may be sensitive, so nothing that contains a value
/// is emitted unless verbose diagnostics were explicitly requested. Every
/// message carries the request ID when one is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics<'a> {
    verbose: bool,
    request_id: Option<&'a str>,
}

impl<'a> Diagnostics<'a> {
    /// Creates diagnostics with the given verbosity and no request ID.
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            request_id: None,
        }
    }

    /// Binds a request ID to every message.
    pub fn with_request_id(mut self, request_id: &'a str) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Returns true if value-bearing diagnostics are enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Returns the request ID, if set.
    pub fn request_id(&self) -> Option<&'a str> {
        self.request_id
    }

    /// Records the outcome of matching `value` against `format`.
    ///
    /// Emitted only in verbose mode.
    pub fn pattern_result(&self, value: &str, format: &str, matched: bool) {
        if !self.verbose {
            return;
        }
        tracing::debug!(
            request_id = self.request_id.unwrap_or("-"),
            value = %value,
            format = %format,
            matched,
            "value, format and match result"
        );
    }

    /// Records that a field was coerced; never includes the value.
    pub fn field_coerced(&self, field: &str, format: &str, rejected: bool) {
        tracing::trace!(
            request_id = self.request_id.unwrap_or("-"),
            field = %field,
            format = %format,
            rejected,
            "field coerced"
        );
    }
}
