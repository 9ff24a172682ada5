//! X-XSS-Protection
//!
//! Legacy switch for the XSS auditor built into older browsers.

use crate::SecurityHeader;

pub const HEADER: &str = "x-xss-protection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XssFilter {
    Disabled,
    Enabled,
    /// Enable filtering and block the page if an attack is detected
    EnabledBlock,
}

impl SecurityHeader for XssFilter {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        match self {
            Self::Disabled => "0",
            Self::Enabled => "1",
            Self::EnabledBlock => "1; mode=block",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xss_filter() {
        assert_eq!(XssFilter::Disabled.to_header_value(), "0");
        assert_eq!(XssFilter::Enabled.to_header_value(), "1");
        assert_eq!(XssFilter::EnabledBlock.to_header_value(), "1; mode=block");
    }
}
