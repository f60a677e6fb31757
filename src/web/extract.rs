//! Extraction boundary traits for web integration.
//!
//! Framework integrations implement these to hand a request to the engine
//! without going through [`RequestAdapter`](super::RequestAdapter).

use super::RequestInputs;

/// Extracts the request identifier used to correlate diagnostics.
///
/// # Examples
///
/// ```
/// use safely::web::ExtractRequestId;
///
/// struct MyFrameworkRequest {
///     trace_id: u64,
/// }
///
/// impl ExtractRequestId for MyFrameworkRequest {
///     fn extract_request_id(&self) -> String {
///         format!("req-{:x}", self.trace_id)
///     }
/// }
///
/// assert_eq!(MyFrameworkRequest { trace_id: 255 }.extract_request_id(), "req-ff");
/// ```
pub trait ExtractRequestId {
    /// Returns a unique identifier for this request.
    fn extract_request_id(&self) -> String;
}

/// Extracts all untrusted inputs from a framework-specific request.
///
/// Every value that crosses the HTTP boundary is considered untrusted. The
/// returned [`RequestInputs`] wraps each of them in `Tainted<RawValue>`.
///
/// # Examples
///
/// ```
/// use safely::web::{ExtractRawInputs, ExtractRequestId, RequestInputs};
/// use safely::RawInputs;
///
/// struct MyFrameworkRequest {
///     id: String,
///     raw_query: String,
/// }
///
/// impl ExtractRequestId for MyFrameworkRequest {
///     fn extract_request_id(&self) -> String {
///         self.id.clone()
///     }
/// }
///
/// impl ExtractRawInputs for MyFrameworkRequest {
///     fn extract_raw_inputs(&self) -> RequestInputs {
///         RequestInputs::new(
///             self.extract_request_id(),
///             RawInputs::from_query(&self.raw_query),
///             RawInputs::new(),
///             RawInputs::new(),
///             RawInputs::new(),
///         )
///     }
/// }
///
/// let req = MyFrameworkRequest { id: "req-1".into(), raw_query: "q=rust".into() };
/// assert!(req.extract_raw_inputs().query().contains_key("q"));
/// ```
pub trait ExtractRawInputs: ExtractRequestId {
    /// Collects the request's inputs, grouped by source.
    fn extract_raw_inputs(&self) -> RequestInputs;
}
