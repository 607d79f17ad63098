//! Stub response model and composer.

use crate::http::{Body, HeaderMap};
use std::sync::Arc;

/// The cause carried by an explicitly failing stub response.
pub type FailureCause = Arc<dyn std::error::Error + Send + Sync>;

/// A declared response for a matched stub request.
///
/// When `failure` is set, the response stands for that failure and
/// consumers must surface it instead of rendering status, headers, or
/// body.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: Option<u16>,
    pub body: Option<Body>,
    pub headers: Option<HeaderMap>,
    pub failure: Option<FailureCause>,
}

impl StubResponse {
    /// A response with the given status and nothing else.
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
            headers: None,
            failure: None,
        }
    }

    /// A response that fails with the given cause instead of answering.
    pub fn from_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            status: None,
            body: None,
            headers: None,
            failure: Some(Arc::new(error)),
        }
    }

    pub fn builder() -> StubResponseBuilder {
        StubResponseBuilder::new()
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Composes a [`StubResponse`] by folding attribute calls left-to-right.
///
/// Later calls for the same field overwrite earlier ones, except headers,
/// which merge.
pub struct StubResponseBuilder {
    status: u16,
    body: Option<Body>,
    headers: HeaderMap,
    failure: Option<FailureCause>,
}

impl StubResponseBuilder {
    fn new() -> Self {
        Self {
            status: 200,
            body: None,
            headers: HeaderMap::new(),
            failure: None,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
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

    /// Sets a JSON body and injects a `Content-Type: application/json`
    /// header. A later header call may still override the content type.
    pub fn json_body(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self.headers.insert("Content-Type", "application/json");
        self
    }

    /// Declares that matching requests fail with the given cause. Other
    /// fields are left as declared but become irrelevant to consumers.
    pub fn fail(mut self, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.failure = Some(Arc::new(error));
        self
    }

    pub fn build(self) -> StubResponse {
        StubResponse {
            status: Some(self.status),
            body: self.body,
            headers: if self.headers.is_empty() { None } else { Some(self.headers) },
            failure: self.failure,
        }
    }
}
