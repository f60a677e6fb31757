//! Web framework integration surface.
//!
//! This module is the boundary between HTTP frameworks and the sanitization
//! engine. It handles:
//! - Collecting request inputs per source (query, form, server metadata, JSON)
//! - Introducing taint at the boundary (every value becomes `Tainted<RawValue>`)
//! - Request-ID propagation into diagnostics
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: nothing here names a framework type.
//!    Framework glue builds a [`RequestAdapter`] or implements the extraction
//!    traits directly.
//!
//! 2. **Taint at Boundary**: inputs are wrapped at collection time and can
//!    only come back out through a validation map.
//!
//! 3. **Allow-list Output**: each `safe_*` function returns only the fields
//!    its validation map names.
//!
//! # Example Flow
//!
//! ```
//! use safely::web::{safe_get, safe_server, ExtractRawInputs, RequestAdapter};
//! use safely::{SanitizedValue, ValidationMap};
//!
//! // 1. Framework glue collects the request
//! let mut adapter = RequestAdapter::new("req-42".to_string());
//! adapter.set_query_string("id=7&first-name=Ada&debug=1");
//! adapter.add_server_var("PATH_INFO", "/20243/12345");
//! let inputs = adapter.extract_raw_inputs();
//!
//! // 2. Each handler names what it accepts
//! let map = ValidationMap::new().with("id", "integer").with("first-name", "text");
//! let query = safe_get(&inputs, Some(&map), false);
//!
//! assert_eq!(query.get("id"), Some(&SanitizedValue::Integer(7)));
//! assert!(!query.contains_key("debug"));
//!
//! let route = ValidationMap::new().with("PATH_INFO", "/20[0-9][0-9][1-3]/[0-9]{5}");
//! let server = safe_server(&inputs, Some(&route), false);
//! assert!(!server.get("PATH_INFO").unwrap().is_rejected());
//! ```

mod adapter;
mod extract;
mod middleware;

pub use adapter::{RequestAdapter, RequestInputs};
pub use extract::{ExtractRawInputs, ExtractRequestId};
pub use middleware::{safe_get, safe_json, safe_post, safe_server, sanitize_source, Source};
