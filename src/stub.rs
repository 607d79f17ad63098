//! Stub definitions: matching specification, response rule, call log.

use crate::http::{Body, Endpoint, HeaderMap, Method, UrlTemplate};
use crate::request::HttpRequest;
use crate::response::StubResponse;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;

/// A rule producing a response from the matched stub.
///
/// The rule receives the stub itself, so it may inspect the recorded
/// calls (the call that triggered it is already recorded) and vary the
/// response by call count.
pub type Responder = Box<dyn Fn(&Stub) -> StubResponse + Send + Sync>;

/// A single recorded match of a stub.
#[derive(Debug, Clone)]
pub struct Call {
    /// When the match happened.
    pub at: DateTime<Utc>,
    /// The request that matched.
    pub request: HttpRequest,
}

/// An immutable matching specification paired with a response rule.
///
/// Every unset attribute is "don't care" and matches any value, including
/// an absent one on the incoming request. A set attribute never matches
/// an absent counterpart. Two structurally identical stubs are distinct
/// objects with independent call logs.
pub struct Stub {
    name: Option<String>,
    url: Option<UrlTemplate>,
    method: Option<Method>,
    headers: Option<HeaderMap>,
    body: Option<Body>,
    responder: Option<Responder>,
    calls: Mutex<Vec<Call>>,
}

impl Stub {
    pub fn builder() -> StubBuilder {
        StubBuilder::default()
    }

    /// Diagnostic label, used in match logging.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All recorded calls, as a snapshot taken at the time of the read.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Matches the request against every declared attribute. On a match,
    /// records a call and produces the response: the responder if one is
    /// set, an empty `200 OK` otherwise. `None` means no match, and no
    /// call is recorded.
    pub(crate) fn handle(&self, request: &HttpRequest) -> Option<StubResponse> {
        if !self.matches(request) {
            return None;
        }

        self.calls.lock().push(Call {
            at: Utc::now(),
            request: request.clone(),
        });

        Some(match &self.responder {
            Some(responder) => responder(self),
            None => StubResponse::new(200),
        })
    }

    fn matches(&self, request: &HttpRequest) -> bool {
        self.matches_method(request.method)
            && self.matches_url(request.url.as_deref())
            && self.matches_headers(request.headers.as_ref())
            && self.matches_body(request.body.as_deref())
    }

    fn matches_method(&self, other: Option<Method>) -> bool {
        // No method to match is "don't care"
        let Some(method) = self.method else { return true };
        // A request without a method never matches a declared one
        let Some(other) = other else { return false };
        method == other
    }

    fn matches_url(&self, other: Option<&str>) -> bool {
        let Some(url) = &self.url else { return true };
        let Some(other) = other else { return false };
        url.matches(other)
    }

    /// Subset match: every declared header must be present on the request
    /// with an identical value; extra request headers are ignored.
    fn matches_headers(&self, other: Option<&HeaderMap>) -> bool {
        let Some(headers) = &self.headers else { return true };
        let Some(other) = other else { return false };
        headers.iter().all(|(name, value)| other.get(name) == Some(value))
    }

    fn matches_body(&self, other: Option<&[u8]>) -> bool {
        let Some(body) = &self.body else { return true };
        body.matches(other)
    }
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("responder", &self.responder.is_some())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

/// Declarative construction of a [`Stub`], one attribute per call.
#[derive(Default)]
pub struct StubBuilder {
    name: Option<String>,
    url: Option<UrlTemplate>,
    method: Option<Method>,
    headers: HeaderMap,
    body: Option<Body>,
    responder: Option<Responder>,
}

impl StubBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<UrlTemplate>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets both the URL template and the method.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.url = Some(endpoint.url);
        self.method = Some(endpoint.method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers<K, V, I>(mut self, headers: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in headers {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Declares a JSON request body matcher. No content-type header is
    /// required of the request: the body matcher stands alone.
    pub fn json_body(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    /// Answers every match with the same response.
    pub fn respond(mut self, response: StubResponse) -> Self {
        self.responder = Some(Box::new(move |_| response.clone()));
        self
    }

    /// Computes the response from the matched stub on every call.
    pub fn respond_with(
        mut self,
        responder: impl Fn(&Stub) -> StubResponse + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn build(self) -> Stub {
        Stub {
            name: self.name,
            url: self.url,
            method: self.method,
            headers: if self.headers.is_empty() { None } else { Some(self.headers) },
            body: self.body,
            responder: self.responder,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new().with_method(Method::Get).with_url(url)
    }

    #[test]
    fn test_empty_stub_matches_any_request() {
        let stub = Stub::builder().build();

        assert!(stub.matches(&HttpRequest::new()));
        assert!(stub.matches(
            &get("https://api.test/users")
                .with_header("Accept", "*/*")
                .with_body("payload")
        ));
    }

    #[test]
    fn test_method_matching_is_asymmetric() {
        let stub = Stub::builder().method(Method::Post).build();

        assert!(stub.matches(&HttpRequest::new().with_method(Method::Post)));
        assert!(!stub.matches(&HttpRequest::new().with_method(Method::Get)));
        // A declared method never matches a request without one
        assert!(!stub.matches(&HttpRequest::new()));
    }

    #[test]
    fn test_url_matching_ignores_query() {
        let stub = Stub::builder().url("https://api.test/users").build();

        assert!(stub.matches(&get("https://api.test/users?page=2")));
        assert!(!stub.matches(&get("https://api.test/orders")));
        assert!(!stub.matches(&HttpRequest::new().with_method(Method::Get)));
    }

    #[test]
    fn test_url_regex_matching() {
        let stub = Stub::builder()
            .url(Regex::new(r"/users/\d+").unwrap())
            .build();

        assert!(stub.matches(&get("https://api.test/users/42?x=1")));
        assert!(!stub.matches(&get("https://api.test/users/abc")));
    }

    #[test]
    fn test_endpoint_sets_url_and_method() {
        let stub = Stub::builder()
            .endpoint(Endpoint::get("https://api.test/users"))
            .build();

        assert!(stub.matches(&get("https://api.test/users")));
        assert!(!stub.matches(
            &HttpRequest::new()
                .with_method(Method::Post)
                .with_url("https://api.test/users")
        ));
    }

    #[test]
    fn test_header_subset_matching() {
        let stub = Stub::builder().header("Authorization", "Bearer token").build();

        // Extra headers on the request never cause a mismatch
        assert!(stub.matches(
            &HttpRequest::new()
                .with_header("AUTHORIZATION", "Bearer token")
                .with_header("Accept", "application/json")
        ));
        assert!(!stub.matches(&HttpRequest::new().with_header("Accept", "application/json")));
        assert!(!stub.matches(&HttpRequest::new().with_header("Authorization", "Bearer other")));
        assert!(!stub.matches(&HttpRequest::new()));
    }

    #[test]
    fn test_json_body_matching_ignores_key_order_and_whitespace() {
        let stub = Stub::builder().json_body(json!({"name": "a", "age": 1})).build();

        assert!(stub.matches(
            &HttpRequest::new().with_body("  {\n  \"age\": 1, \"name\": \"a\"\n}  ")
        ));
        assert!(!stub.matches(&HttpRequest::new().with_body(r#"{"name": "b", "age": 1}"#)));
        assert!(!stub.matches(&HttpRequest::new().with_body("not json")));
        assert!(!stub.matches(&HttpRequest::new()));
    }

    #[test]
    fn test_json_body_does_not_require_headers() {
        // A JSON body matcher must not imply a content-type header
        let stub = Stub::builder().json_body(json!({"name": "a"})).build();
        assert!(stub.matches(&HttpRequest::new().with_body(r#"{"name": "a"}"#)));
    }

    #[test]
    fn test_handle_records_calls_only_on_match() {
        let stub = Stub::builder().url("https://api.test/users").build();

        assert!(stub.handle(&get("https://api.test/other")).is_none());
        assert!(stub.calls().is_empty());

        let response = stub.handle(&get("https://api.test/users")).unwrap();
        assert_eq!(response.status, Some(200));
        assert!(response.body.is_none());

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].request.url.as_deref(), Some("https://api.test/users"));
    }

    #[test]
    fn test_responder_sees_the_triggering_call() {
        let stub = Stub::builder()
            .respond_with(|stub| StubResponse::new(200 + stub.call_count() as u16))
            .build();

        assert_eq!(stub.handle(&HttpRequest::new()).unwrap().status, Some(201));
        assert_eq!(stub.handle(&HttpRequest::new()).unwrap().status, Some(202));
    }

    #[test]
    fn test_identical_stubs_have_independent_call_logs() {
        let first = Stub::builder().url("https://api.test/users").build();
        let second = Stub::builder().url("https://api.test/users").build();

        first.handle(&get("https://api.test/users")).unwrap();

        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn test_concurrent_call_recording() {
        let stub = Arc::new(Stub::builder().build());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stub = Arc::clone(&stub);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stub.handle(&HttpRequest::new()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stub.call_count(), 800);
    }
}
