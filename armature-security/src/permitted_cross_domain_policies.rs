//! X-Permitted-Cross-Domain-Policies
//!
//! Controls cross-domain policy files for Adobe Flash and Acrobat clients.

use crate::SecurityHeader;

pub const HEADER: &str = "x-permitted-cross-domain-policies";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermittedCrossDomainPolicies {
    /// No cross-domain policies allowed
    None,
    /// Only master policy allowed
    MasterOnly,
    /// Only policies served with the policy content type
    ByContentType,
    /// All cross-domain policies allowed
    All,
}

impl SecurityHeader for PermittedCrossDomainPolicies {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        match self {
            Self::None => "none",
            Self::MasterOnly => "master-only",
            Self::ByContentType => "by-content-type",
            Self::All => "all",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permitted_cross_domain_policies() {
        assert_eq!(PermittedCrossDomainPolicies::None.to_header_value(), "none");
        assert_eq!(
            PermittedCrossDomainPolicies::MasterOnly.to_header_value(),
            "master-only"
        );
        assert_eq!(PermittedCrossDomainPolicies::All.to_header_value(), "all");
    }
}
