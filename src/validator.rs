//! Pre-render request checks.

use armature_core::{HttpMethod, HttpRequest, HttpResponse, HttpStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Body of the rejection response
pub const REJECTION_BODY: &str = "invalid JSON request";

static ANDROID_USER_AGENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)android").unwrap());

/// Rejects requests matching the legacy Android JSON-hijacking pattern.
///
/// A request is rejected when all of these hold:
/// - it has no `X-Requested-With` header
/// - its `User-Agent` mentions Android
/// - it carries a `Cookie` header
/// - its method is `GET` (a request without a method counts as `GET`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestValidator {
    enabled: bool,
}

impl RequestValidator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The rejection response for `request`, or `None` to continue rendering.
    pub fn validate(&self, request: &HttpRequest) -> Option<HttpResponse> {
        if !self.enabled || !Self::is_hijacking_attempt(request) {
            return None;
        }

        warn!(
            path = %request.path,
            user_agent = request.headers.user_agent().map(String::as_str).unwrap_or(""),
            "rejecting possible JSON hijacking request"
        );
        Some(Self::rejection())
    }

    /// Whether `request` matches the hijacking pattern, regardless of whether
    /// the check is enabled
    pub fn is_hijacking_attempt(request: &HttpRequest) -> bool {
        let headers = &request.headers;

        headers.requested_with().is_none()
            && headers
                .user_agent()
                .is_some_and(|ua| ANDROID_USER_AGENT.is_match(ua))
            && headers.cookie().is_some()
            && request.method() == HttpMethod::GET
    }

    /// 403 plain-text response sent in place of the JSON body
    pub fn rejection() -> HttpResponse {
        HttpResponse::text(HttpStatus::Forbidden.code(), REJECTION_BODY)
    }
}
