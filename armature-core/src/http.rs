// HTTP request and response types

use crate::HeaderMap;
use std::fmt;

/// HTTP request method
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request wrapper
///
/// `method` is optional because some hosts (test harnesses, internal
/// dispatch) build requests without one; consumers treat a missing method
/// as `GET`.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: Option<HttpMethod>,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// The request method, defaulting to `GET` when none was recorded
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::GET)
    }

    /// Get a header by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// HTTP response wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Plain-text response with `Content-Type` and `Content-Length` set
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::new(status);
        response.headers.set_content_type("text/plain");
        response.set_body(body.into().into_bytes());
        response
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Replace the body and keep `Content-Length` in step with it
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.headers.set_content_length(body.len());
        self.body = body;
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.content_type().map(String::as_str)
    }

    pub fn content_length(&self) -> Option<usize> {
        self.headers.content_length()
    }

    /// Body as UTF-8 text, if it is valid UTF-8
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
