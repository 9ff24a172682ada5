//! HTTP Strict Transport Security (HSTS)
//!
//! Forces browsers to use HTTPS.

use crate::SecurityHeader;

pub const HEADER: &str = "strict-transport-security";

/// Default max-age: roughly twenty years.
pub const DEFAULT_MAX_AGE: u64 = 631_138_519;

/// HSTS configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsConfig {
    /// Max age in seconds
    pub max_age: u64,

    /// Include subdomains
    pub include_subdomains: bool,

    /// Preload (submit to browser preload list)
    pub preload: bool,
}

impl HstsConfig {
    /// Create a new HSTS configuration covering only the current host
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            include_subdomains: false,
            preload: false,
        }
    }

    pub fn include_subdomains(mut self, include: bool) -> Self {
        self.include_subdomains = include;
        self
    }

    pub fn preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl SecurityHeader for HstsConfig {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        let mut parts = vec![format!("max-age={}", self.max_age)];

        if self.include_subdomains {
            parts.push("includeSubDomains".to_string());
        }

        if self.preload {
            parts.push("preload".to_string());
        }

        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsts_default() {
        assert_eq!(HstsConfig::default().to_header_value(), "max-age=631138519");
    }

    #[test]
    fn test_hsts_subdomains() {
        let config = HstsConfig::new(31536000).include_subdomains(true);
        assert_eq!(config.to_header_value(), "max-age=31536000; includeSubDomains");
    }

    #[test]
    fn test_hsts_preload() {
        let config = HstsConfig::new(31536000)
            .include_subdomains(true)
            .preload(true);
        assert_eq!(
            config.to_header_value(),
            "max-age=31536000; includeSubDomains; preload"
        );
    }
}
