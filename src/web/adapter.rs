//! Request adapter for collecting untrusted request inputs.

use crate::{Error, RawInputs, RawValue};

use super::{ExtractRawInputs, ExtractRequestId};

/// Adapter for converting framework-specific HTTP requests into raw inputs.
///
/// `RequestAdapter` is the primary integration point between web frameworks
/// and this crate. It holds owned copies of everything a request carries,
/// grouped by source, so that framework code only has to copy values in.
///
/// # Design Notes
///
/// This type intentionally contains simple, owned data to avoid coupling
/// to any specific framework's request types. Framework-specific code
/// should implement `From<FrameworkRequest>` for `RequestAdapter`.
///
/// # Examples
///
/// ```
/// use safely::web::{ExtractRawInputs, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345".to_string());
/// adapter.set_query_string("?search=user+input");
/// adapter.add_form_field("comment", "hello");
/// adapter.add_server_var("REQUEST_METHOD", "POST");
///
/// let inputs = adapter.extract_raw_inputs();
/// assert_eq!(inputs.request_id(), "req-12345");
/// assert!(inputs.query().contains_key("search"));
/// assert!(inputs.form().contains_key("comment"));
/// assert!(inputs.server().contains_key("REQUEST_METHOD"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    /// Unique request identifier (required)
    request_id: String,
    /// Query parameters from the URL
    query: RawInputs,
    /// Form body fields
    form: RawInputs,
    /// Server/request metadata (`PATH_INFO`, `REQUEST_METHOD`, headers)
    server: RawInputs,
    /// Members of a JSON body
    json: RawInputs,
}

impl RequestAdapter {
    /// Creates a new request adapter with the given request ID.
    ///
    /// All sources start empty.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            query: RawInputs::new(),
            form: RawInputs::new(),
            server: RawInputs::new(),
            json: RawInputs::new(),
        }
    }

    /// Replaces the query parameters with those decoded from `query`.
    pub fn set_query_string(&mut self, query: &str) {
        self.query = RawInputs::from_query(query);
    }

    /// Adds a single query parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.query.insert(key, value);
    }

    /// Adds a single form field.
    pub fn add_form_field(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.form.insert(key, value);
    }

    /// Replaces the form fields with those decoded from a url-encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the body is not UTF-8. The adapter is
    /// left unchanged and the request should be refused.
    pub fn set_form_body(&mut self, body: &[u8]) -> Result<(), Error> {
        self.form = RawInputs::from_form_bytes(body)?;
        Ok(())
    }

    /// Adds a server metadata variable.
    pub fn add_server_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.server.insert(key, value.into());
    }

    /// Replaces the JSON members with those decoded from `body`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body is not a JSON object.
    pub fn set_json_body(&mut self, body: &str) -> Result<(), Error> {
        self.json = RawInputs::from_json(body)?;
        Ok(())
    }

    /// Returns a reference to the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl ExtractRequestId for RequestAdapter {
    fn extract_request_id(&self) -> String {
        self.request_id.clone()
    }
}

impl ExtractRawInputs for RequestAdapter {
    fn extract_raw_inputs(&self) -> RequestInputs {
        RequestInputs {
            request_id: self.extract_request_id(),
            query: self.query.clone(),
            form: self.form.clone(),
            server: self.server.clone(),
            json: self.json.clone(),
        }
    }
}

/// All tainted inputs of one request, grouped by source.
///
/// Values stay tainted: the only way to read them is one of the `safe_*`
/// functions, which require a validation map (or infer one).
#[derive(Debug, Clone)]
pub struct RequestInputs {
    request_id: String,
    query: RawInputs,
    form: RawInputs,
    server: RawInputs,
    json: RawInputs,
}

impl RequestInputs {
    /// Bundles already-collected sources.
    pub fn new(
        request_id: String,
        query: RawInputs,
        form: RawInputs,
        server: RawInputs,
        json: RawInputs,
    ) -> Self {
        Self {
            request_id,
            query,
            form,
            server,
            json,
        }
    }

    /// The request ID carried into diagnostics.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Query parameters.
    pub fn query(&self) -> &RawInputs {
        &self.query
    }

    /// Form fields.
    pub fn form(&self) -> &RawInputs {
        &self.form
    }

    /// Server metadata.
    pub fn server(&self) -> &RawInputs {
        &self.server
    }

    /// JSON body members.
    pub fn json(&self) -> &RawInputs {
        &self.json
    }
}
