//! HTTP transport used by every networked stage.
//!
//! Production requests go through a shared `ureq::Agent`. Non-2xx responses
//! are returned as values rather than errors so each stage decides what a
//! status means; only transport failures surface as `LocationError::Transport`.

use super::types::LocationError;
use serde_json::Value;

const USER_AGENT: &str = concat!("placefinder/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// An outgoing request. Query parameters are already encoded into `url`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body, POST only.
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            form: Some(form),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("bearer {}", token))
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse a 2xx body as JSON; any other status becomes `LocationError::Status`.
    pub fn into_json(self) -> Result<Value, LocationError> {
        if !self.is_success() {
            return Err(LocationError::Status {
                status: self.status,
                body: truncate(&self.body, 200),
            });
        }
        serde_json::from_str(&self.body).map_err(|e| LocationError::Parse(e.to_string()))
    }
}

/// Blocking HTTP client seam.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, LocationError>;
}

/// `ureq`-backed client. Timeouts are ureq's defaults.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, LocationError> {
        let mut req = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        let result = match &request.form {
            Some(form) => {
                let pairs: Vec<(&str, &str)> =
                    form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                req.send_form(&pairs)
            }
            None => req.call(),
        };

        match result {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| LocationError::Transport(e.to_string()))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(LocationError::Transport(e.to_string())),
        }
    }
}

/// Build `base?k=v&...` with proper percent-encoding.
pub fn url_with_params(base: &str, params: &[(&str, &str)]) -> Result<String, LocationError> {
    url::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| LocationError::Parse(format!("bad endpoint '{}': {}", base, e)))
}

/// Append a single path segment (percent-encoded) to a base URL.
pub fn url_with_segment(base: &str, segment: &str) -> Result<String, LocationError> {
    let mut url =
        url::Url::parse(base).map_err(|e| LocationError::Parse(format!("bad endpoint '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| LocationError::Parse(format!("endpoint '{}' cannot take a path", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url.into())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
