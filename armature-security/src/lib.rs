//! Security headers for Armature JSON responses - inspired by Helmet for Express.js
//!
//! [`SecureHeaders`] is an ordered table of header name to value. Every
//! entry is either enabled (it carries a value) or disabled (it is never
//! emitted). Applying the table to a response overwrites any value the
//! handler already set for an enabled header and leaves disabled headers
//! alone.
//!
//! # Example
//!
//! ```
//! use armature_core::HttpResponse;
//! use armature_security::SecureHeaders;
//! use armature_security::frame_guard::FrameGuard;
//! use armature_security::hsts::HstsConfig;
//!
//! // Recommended defaults for JSON APIs
//! let headers = SecureHeaders::default();
//!
//! // Or customize as needed
//! let headers = SecureHeaders::default()
//!     .with_hsts(HstsConfig::new(31536000).include_subdomains(true))
//!     .with_frame_guard(FrameGuard::SameOrigin)
//!     .disable("referrer-policy");
//!
//! let response = headers.apply(HttpResponse::ok());
//! assert_eq!(response.headers.get("X-Frame-Options").map(String::as_str), Some("SAMEORIGIN"));
//! assert!(!response.headers.contains("Referrer-Policy"));
//! ```

pub mod content_security_policy;
pub mod content_type_options;
pub mod download_options;
pub mod frame_guard;
pub mod hsts;
pub mod permitted_cross_domain_policies;
pub mod referrer_policy;
pub mod xss_filter;

pub use content_security_policy::CspConfig;
pub use content_type_options::ContentTypeOptions;
pub use download_options::DownloadOptions;
pub use frame_guard::FrameGuard;
pub use hsts::HstsConfig;
pub use permitted_cross_domain_policies::PermittedCrossDomainPolicies;
pub use referrer_policy::ReferrerPolicy;
pub use xss_filter::XssFilter;

use armature_core::{HeaderMap, HttpResponse};
use tracing::debug;

/// A typed security header policy.
pub trait SecurityHeader {
    /// Lowercase header name
    const NAME: &'static str;

    /// Convert to header value
    fn to_header_value(&self) -> String;
}

/// One row of the security header table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: String,
    /// `None` marks the header as disabled
    pub value: Option<String>,
}

/// Ordered table of security headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureHeaders {
    entries: Vec<HeaderEntry>,
}

impl SecureHeaders {
    /// Create an empty table (no headers emitted)
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Enable a header with the given value, replacing any entry with the
    /// same name (case-insensitive)
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.upsert(name.into(), Some(value.into()));
        self
    }

    /// Disable a header. Disabled headers are kept in the table so later
    /// overlays can tell "disabled" from "never configured".
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.upsert(name.into(), None);
        self
    }

    /// Set a typed header policy
    pub fn with<H: SecurityHeader>(self, header: H) -> Self {
        self.set(H::NAME, header.to_header_value())
    }

    pub fn with_csp(self, config: CspConfig) -> Self {
        self.with(config)
    }

    pub fn with_hsts(self, config: HstsConfig) -> Self {
        self.with(config)
    }

    pub fn with_content_type_options(self, options: ContentTypeOptions) -> Self {
        self.with(options)
    }

    pub fn with_download_options(self, options: DownloadOptions) -> Self {
        self.with(options)
    }

    pub fn with_frame_guard(self, guard: FrameGuard) -> Self {
        self.with(guard)
    }

    pub fn with_permitted_cross_domain_policies(
        self,
        policies: PermittedCrossDomainPolicies,
    ) -> Self {
        self.with(policies)
    }

    pub fn with_referrer_policy(self, policy: ReferrerPolicy) -> Self {
        self.with(policy)
    }

    pub fn with_xss_filter(self, filter: XssFilter) -> Self {
        self.with(filter)
    }

    /// Overlay entries onto this table key-by-key. Overlay entries win; a
    /// `None` value disables the header.
    pub fn overlay<I, K>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        for (name, value) in entries {
            self.upsert(name.into(), value);
        }
        self
    }

    /// Enabled value for a header, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|e| e.value.as_deref())
    }

    /// Whether the table has an explicitly disabled entry for `name`
    pub fn is_disabled(&self, name: &str) -> bool {
        self.find(name).is_some_and(|e| e.value.is_none())
    }

    /// All entries, enabled and disabled, in table order
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    /// Enabled headers in table order
    pub fn enabled(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| e.value.as_deref().map(|v| (e.name.as_str(), v)))
    }

    /// Write every enabled header into `headers`, overwriting existing values
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        let mut applied = 0usize;
        for (name, value) in self.enabled() {
            headers.insert(name, value);
            applied += 1;
        }
        debug!(applied, "applied security headers");
    }

    /// Apply security headers to a response
    pub fn apply(&self, mut response: HttpResponse) -> HttpResponse {
        self.apply_to(&mut response.headers);
        response
    }

    fn find(&self, name: &str) -> Option<&HeaderEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    fn upsert(&mut self, name: String, value: Option<String>) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.value = value,
            None => self.entries.push(HeaderEntry { name, value }),
        }
    }
}

impl Default for SecureHeaders {
    /// The recommended table for JSON APIs.
    ///
    /// `x-download-options` is present but disabled.
    fn default() -> Self {
        Self::empty()
            .with_csp(CspConfig::none())
            .with_hsts(HstsConfig::default())
            .with_content_type_options(ContentTypeOptions::NoSniff)
            .disable(download_options::HEADER)
            .with_frame_guard(FrameGuard::Deny)
            .with_permitted_cross_domain_policies(PermittedCrossDomainPolicies::None)
            .with_xss_filter(XssFilter::EnabledBlock)
            .with_referrer_policy(ReferrerPolicy::NoReferrer)
    }
}
