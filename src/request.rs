//! The intercepted-request model handed to dispatch.

use crate::http::{HeaderMap, Method};

/// An outgoing HTTP request as observed by an interception hook.
///
/// Every field is optional: transport adapters surface whatever the
/// underlying client actually provided, and the matcher treats absent
/// fields according to its own rules rather than rejecting the request
/// outright.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(HeaderMap::new).insert(name, value);
        self
    }

    pub fn with_headers<K, V, I>(mut self, headers: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = self.headers.get_or_insert_with(HeaderMap::new);
        for (name, value) in headers {
            map.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}
