//! Stubbles
//!
//! An HTTP request interception and stub-matching engine that replaces
//! real network calls with deterministic, declaratively defined
//! responses during testing. Stubs are matched in registration order;
//! the first match answers, and unmatched requests fail with a
//! distinguishable error instead of silently hitting the network.
//!
//! # Features
//!
//! - **Request Matching**: match by URL template (exact, regex, glob),
//!   method, header subset, and body; unset attributes match anything
//! - **Static Responses**: declare status, headers, and bodies with a
//!   composable builder
//! - **Dynamic Responses**: compute responses from the matched stub,
//!   e.g. to sequence replies by call count
//! - **Failure Injection**: declare that matching requests fail with a
//!   specific error
//! - **Call Recording**: every match is recorded on its stub for later
//!   assertions
//! - **Declarative Stub Sets**: load stubs from YAML definitions
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stubbles::{HttpRequest, Method, StubResponse, Stubbles};
//!
//! let engine = Stubbles::new();
//! let stub = engine.stub(|s| {
//!     s.url("https://api.test/users")
//!         .method(Method::Get)
//!         .respond(
//!             StubResponse::builder()
//!                 .status(200)
//!                 .json_body(json!({ "ok": true }))
//!                 .build(),
//!         )
//! });
//!
//! let request = HttpRequest::new()
//!     .with_method(Method::Get)
//!     .with_url("https://api.test/users?page=1");
//!
//! let response = engine.dispatch(&request).unwrap();
//! assert_eq!(response.status, Some(200));
//! assert_eq!(stub.call_count(), 1);
//! ```

pub mod config;
pub mod engine;
pub mod hook;
pub mod http;
mod json;
pub mod request;
pub mod response;
pub mod stub;

pub use config::{DeclaredFailure, StubSet};
pub use engine::{Error, Stubbles};
pub use hook::HttpClientHook;
pub use http::{Body, Endpoint, HeaderMap, InvalidMethod, Method, UrlTemplate};
pub use request::HttpRequest;
pub use response::{FailureCause, StubResponse, StubResponseBuilder};
pub use stub::{Call, Responder, Stub, StubBuilder};
