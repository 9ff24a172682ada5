//! Content Security Policy (CSP) configuration
//!
//! A JSON API never serves documents that load resources, so the default
//! policy denies everything.

use crate::SecurityHeader;

pub const HEADER: &str = "content-security-policy";

/// Content Security Policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CspConfig {
    /// Directives in emission order
    pub directives: Vec<(String, Vec<String>)>,
}

impl CspConfig {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// `default-src 'none'`
    pub fn none() -> Self {
        Self::new().default_src(vec!["'none'".to_string()])
    }

    /// Add a directive, replacing an existing one with the same name
    pub fn directive(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        let name = name.into();
        match self.directives.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.directives.push((name, values)),
        }
        self
    }

    pub fn default_src(self, sources: Vec<String>) -> Self {
        self.directive("default-src", sources)
    }

    pub fn frame_ancestors(self, sources: Vec<String>) -> Self {
        self.directive("frame-ancestors", sources)
    }
}

impl SecurityHeader for CspConfig {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        self.directives
            .iter()
            .map(|(directive, values)| {
                if values.is_empty() {
                    directive.clone()
                } else {
                    format!("{} {}", directive, values.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
