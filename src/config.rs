//! Declarative stub sets loaded from YAML.
//!
//! A `StubSet` describes stubs as data: request matcher attributes and a
//! static response. Definitions are validated, then converted into
//! engine stubs with `register_all`. Dynamic responses stay in code via
//! [`StubBuilder::respond_with`](crate::stub::StubBuilder::respond_with).

use crate::engine::Stubbles;
use crate::http::{Body, Method, UrlTemplate};
use crate::response::StubResponse;
use crate::stub::Stub;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A collection of declarative stub definitions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StubSet {
    /// List of stub definitions, in priority order
    #[serde(default)]
    pub stubs: Vec<StubDefinition>,
}

impl StubSet {
    /// Load a stub set from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a stub set from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let set: Self = serde_yaml::from_str(yaml)?;
        set.validate()?;
        Ok(set)
    }

    /// Validate every definition (pattern compilation, status ranges).
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, stub) in self.stubs.iter().enumerate() {
            stub.build()
                .map_err(|e| anyhow::anyhow!("stub {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Build every definition and register it with the engine, in order.
    pub fn register_all(&self, engine: &Stubbles) -> anyhow::Result<Vec<Arc<Stub>>> {
        let mut registered = Vec::with_capacity(self.stubs.len());
        for (i, definition) in self.stubs.iter().enumerate() {
            let stub = definition
                .build()
                .map_err(|e| anyhow::anyhow!("stub {}: {}", i, e))?;
            registered.push(engine.register(stub));
        }
        Ok(registered)
    }
}

/// A single declarative stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StubDefinition {
    /// Optional name, used in match logging
    #[serde(default)]
    pub name: Option<String>,

    /// Request matcher attributes (all optional, absent = any)
    #[serde(default)]
    pub request: RequestDefinition,

    /// Response to return; omitted means an empty 200
    #[serde(default)]
    pub response: Option<ResponseDefinition>,
}

impl StubDefinition {
    /// Convert the definition into an engine stub.
    pub fn build(&self) -> anyhow::Result<Stub> {
        let mut builder = Stub::builder();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(method) = self.request.method {
            builder = builder.method(method);
        }
        if let Some(url) = &self.request.url {
            builder = builder.url(url.build()?);
        }
        if let Some(headers) = &self.request.headers {
            builder = builder.headers(
                headers.iter().map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        if let Some(body) = &self.request.body {
            builder = builder.body(body.build()?);
        }
        if let Some(response) = &self.response {
            builder = builder.respond(response.build()?);
        }
        Ok(builder.build())
    }
}

/// Request matcher attributes of a declarative stub.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RequestDefinition {
    /// HTTP method to match (absent = any)
    #[serde(default)]
    pub method: Option<Method>,

    /// URL matching
    #[serde(default)]
    pub url: Option<UrlPattern>,

    /// Header subset to require
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Body matching
    #[serde(default)]
    pub body: Option<BodyDefinition>,
}

/// URL matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UrlPattern {
    /// Literal URL, query ignored
    Exact { value: String },
    /// Regex matched anywhere in the URL
    Regex { pattern: String },
    /// Glob over the whole URL
    Glob { pattern: String },
}

impl UrlPattern {
    pub fn build(&self) -> anyhow::Result<UrlTemplate> {
        Ok(match self {
            UrlPattern::Exact { value } => UrlTemplate::exact(value.clone()),
            UrlPattern::Regex { pattern } => UrlTemplate::regex(pattern)
                .map_err(|e| anyhow::anyhow!("invalid regex: {}", e))?,
            UrlPattern::Glob { pattern } => UrlTemplate::glob(pattern)
                .map_err(|e| anyhow::anyhow!("invalid glob: {}", e))?,
        })
    }
}

/// Body configuration, shared by request matchers and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyDefinition {
    /// No payload
    Empty,
    /// Plain text payload
    Text { content: String },
    /// Base64 encoded binary payload
    Base64 { content: String },
    /// JSON document
    Json { content: serde_json::Value },
}

impl BodyDefinition {
    pub fn build(&self) -> anyhow::Result<Body> {
        Ok(match self {
            BodyDefinition::Empty => Body::Empty,
            BodyDefinition::Text { content } => Body::bytes(content.as_bytes()),
            BodyDefinition::Base64 { content } => {
                use base64::Engine;
                let data = base64::engine::general_purpose::STANDARD
                    .decode(content)
                    .map_err(|e| anyhow::anyhow!("invalid base64: {}", e))?;
                Body::bytes(data)
            }
            BodyDefinition::Json { content } => Body::json(content.clone()),
        })
    }
}

/// Response attributes of a declarative stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDefinition {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body
    #[serde(default)]
    pub body: Option<BodyDefinition>,

    /// Fail matching requests with this message instead of responding
    #[serde(default)]
    pub failure: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl ResponseDefinition {
    pub fn build(&self) -> anyhow::Result<StubResponse> {
        if !(100..=599).contains(&self.status) {
            anyhow::bail!("invalid status code: {}", self.status);
        }

        let mut builder = StubResponse::builder().status(self.status);

        if let Some(body) = &self.body {
            builder = match body {
                BodyDefinition::Json { content } => builder.json_body(content.clone()),
                other => builder.body(other.build()?),
            };
        }

        // Declared headers land after the body so an explicit Content-Type wins
        builder = builder.headers(
            self.headers.iter().map(|(name, value)| (name.clone(), value.clone())),
        );

        if let Some(message) = &self.failure {
            builder = builder.fail(DeclaredFailure(message.clone()));
        }

        Ok(builder.build())
    }
}

/// The failure cause produced by a declared `failure` response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct DeclaredFailure(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Error;
    use crate::request::HttpRequest;
    use std::io::Write;

    #[test]
    fn test_parse_simple_stub() {
        let yaml = r#"
stubs:
  - name: users
    request:
      method: get
      url:
        type: exact
        value: https://api.test/users
    response:
      status: 200
      body:
        type: text
        content: "Hello, World!"
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        assert_eq!(set.stubs.len(), 1);
        assert_eq!(set.stubs[0].name.as_deref(), Some("users"));
    }

    #[test]
    fn test_method_accepts_any_case() {
        let yaml = r#"
stubs:
  - request:
      method: GET
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        assert_eq!(set.stubs[0].request.method, Some(Method::Get));
    }

    #[test]
    fn test_registered_json_stub_answers_dispatch() {
        let yaml = r#"
stubs:
  - request:
      url:
        type: regex
        pattern: "/api/"
    response:
      status: 200
      body:
        type: json
        content:
          message: success
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        let engine = Stubbles::new();
        let registered = set.register_all(&engine).unwrap();
        assert_eq!(registered.len(), 1);

        let response = engine
            .dispatch(&HttpRequest::new().with_url("https://host.test/api/users"))
            .unwrap();
        assert_eq!(response.status, Some(200));
        let headers = response.headers.unwrap();
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_declared_content_type_wins_over_json_body() {
        let yaml = r#"
stubs:
  - response:
      headers:
        Content-Type: application/problem+json
      body:
        type: json
        content:
          error: bad
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        let response = set.stubs[0].response.as_ref().unwrap().build().unwrap();
        let headers = response.headers.unwrap();
        assert_eq!(headers.get("content-type"), Some("application/problem+json"));
    }

    #[test]
    fn test_base64_request_body() {
        // "hello"
        let yaml = r#"
stubs:
  - request:
      body:
        type: base64
        content: aGVsbG8=
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        let engine = Stubbles::new();
        set.register_all(&engine).unwrap();

        assert!(engine.dispatch(&HttpRequest::new().with_body("hello")).is_ok());
        let err = engine
            .dispatch(&HttpRequest::new().with_body("other"))
            .unwrap_err();
        assert!(matches!(err, Error::NoMatch(_)));
    }

    #[test]
    fn test_declared_failure_response() {
        let yaml = r#"
stubs:
  - request:
      url:
        type: exact
        value: https://api.test/down
    response:
      failure: "connection reset"
"#;
        let set = StubSet::from_yaml(yaml).unwrap();
        let engine = Stubbles::new();
        set.register_all(&engine).unwrap();

        let response = engine
            .dispatch(&HttpRequest::new().with_url("https://api.test/down"))
            .unwrap();
        assert!(response.is_failure());
        assert_eq!(response.failure.unwrap().to_string(), "connection reset");
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let yaml = r#"
stubs:
  - request:
      url:
        type: regex
        pattern: "["
"#;
        assert!(StubSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let yaml = r#"
stubs:
  - response:
      status: 99
"#;
        assert!(StubSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(StubSet::from_yaml("stubs: []\nextra: 1").is_err());
    }

    #[test]
    fn test_from_file() {
        let yaml = r#"
stubs:
  - name: from-file
    request:
      method: get
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let set = StubSet::from_file(file.path()).unwrap();
        assert_eq!(set.stubs.len(), 1);
        assert_eq!(set.stubs[0].name.as_deref(), Some("from-file"));
    }
}
