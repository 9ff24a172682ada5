//! Frame Guard (X-Frame-Options)
//!
//! Mitigates clickjacking attacks.

use crate::SecurityHeader;

pub const HEADER: &str = "x-frame-options";

/// Frame Guard options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameGuard {
    /// Deny all framing
    Deny,
    /// Allow framing from same origin
    SameOrigin,
    /// Allow framing from specific origin
    AllowFrom(String),
}

impl SecurityHeader for FrameGuard {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        match self {
            Self::Deny => "DENY".to_string(),
            Self::SameOrigin => "SAMEORIGIN".to_string(),
            Self::AllowFrom(origin) => format!("ALLOW-FROM {}", origin),
        }
    }
}
