//! Shared HTTP vocabulary: methods, headers, URL templates, and bodies.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The HTTP method of a stub request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Head => "head",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Connect => "connect",
            Method::Options => "options",
            Method::Trace => "trace",
            Method::Patch => "patch",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unrecognized HTTP method.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized HTTP method: {0}")]
pub struct InvalidMethod(String);

impl FromStr for Method {
    type Err = InvalidMethod;

    /// Parses case-insensitively; methods are lower-cased internally.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "head" => Ok(Method::Head),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "delete" => Ok(Method::Delete),
            "connect" => Ok(Method::Connect),
            "options" => Ok(Method::Options),
            "trace" => Ok(Method::Trace),
            "patch" => Ok(Method::Patch),
            other => Err(InvalidMethod(other.to_string())),
        }
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// HTTP header fields for stub requests and stub responses.
///
/// Header names are compared case-insensitively: keys are lower-cased on
/// insertion and later insertions for the same key overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap(BTreeMap<String, String>);

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Extends with the entries of `other`, overwriting on key collision.
    pub fn merge(&mut self, other: HeaderMap) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A URL template matched against the absolute URL of an incoming request.
#[derive(Debug, Clone)]
pub enum UrlTemplate {
    /// A literal URL, compared with the query component stripped from
    /// both sides.
    Exact(String),
    /// A regular expression tested for at least one match anywhere in the
    /// candidate URL.
    Regex(Regex),
    /// A glob pattern matched against the whole candidate URL.
    Glob(globset::GlobMatcher),
}

impl UrlTemplate {
    pub fn exact(url: impl Into<String>) -> Self {
        UrlTemplate::Exact(url.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(UrlTemplate::Regex(Regex::new(pattern)?))
    }

    pub fn glob(pattern: &str) -> Result<Self, globset::Error> {
        Ok(UrlTemplate::Glob(globset::Glob::new(pattern)?.compile_matcher()))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            UrlTemplate::Exact(expected) => strip_query(expected) == strip_query(candidate),
            UrlTemplate::Regex(regex) => regex.is_match(candidate),
            UrlTemplate::Glob(glob) => glob.is_match(candidate),
        }
    }
}

impl From<&str> for UrlTemplate {
    fn from(url: &str) -> Self {
        UrlTemplate::Exact(url.to_string())
    }
}

impl From<String> for UrlTemplate {
    fn from(url: String) -> Self {
        UrlTemplate::Exact(url)
    }
}

impl From<Regex> for UrlTemplate {
    fn from(regex: Regex) -> Self {
        UrlTemplate::Regex(regex)
    }
}

/// Removes the query component of a URL, keeping any fragment.
fn strip_query(url: &str) -> Cow<'_, str> {
    let Some(query_start) = url.find('?') else {
        return Cow::Borrowed(url);
    };
    match url[query_start..].find('#') {
        Some(offset) => Cow::Owned(format!(
            "{}{}",
            &url[..query_start],
            &url[query_start + offset..]
        )),
        None => Cow::Borrowed(&url[..query_start]),
    }
}

/// A convenience pairing of a URL template and a request method.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: UrlTemplate,
    pub method: Method,
}

impl Endpoint {
    pub fn new(url: impl Into<UrlTemplate>, method: Method) -> Self {
        Self { url: url.into(), method }
    }

    pub fn get(url: impl Into<UrlTemplate>) -> Self {
        Self::new(url, Method::Get)
    }
}

/// The body of a stub request or stub response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No payload at all.
    Empty,
    /// Raw bytes; `None` stands for "any payload".
    Bytes(Option<Vec<u8>>),
    /// A JSON document, serialized on demand.
    Json(serde_json::Value),
}

impl Body {
    pub fn empty() -> Self {
        Body::Empty
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Body::Bytes(Some(data.into()))
    }

    pub fn json(value: serde_json::Value) -> Self {
        Body::Json(value)
    }

    /// The raw payload of this body.
    ///
    /// JSON bodies serialize lazily; a serialization failure yields `None`.
    pub fn raw_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Body::Empty => None,
            Body::Bytes(data) => data.clone(),
            Body::Json(value) => serde_json::to_vec(value).ok(),
        }
    }

    /// Matches the declared body against observed request bytes.
    pub(crate) fn matches(&self, observed: Option<&[u8]>) -> bool {
        match self {
            Body::Empty => observed.map(|data| data.is_empty()).unwrap_or(true),
            Body::Bytes(None) => true,
            Body::Bytes(Some(expected)) => {
                observed.map(|data| expected.as_slice() == data).unwrap_or(false)
            }
            Body::Json(expected) => {
                let Some(data) = observed else { return false };
                match serde_json::from_slice::<serde_json::Value>(data) {
                    Ok(actual) => crate::json::semantic_eq(expected, &actual),
                    Err(_) => false,
                }
            }
        }
    }
}
