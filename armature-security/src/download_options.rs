//! X-Download-Options
//!
//! Prevents Internet Explorer from opening downloads in the site's context.
//! Disabled in the default table; JSON responses are not downloads.

use crate::SecurityHeader;

pub const HEADER: &str = "x-download-options";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOptions {
    /// Prevent opening downloads in context
    NoOpen,
}

impl SecurityHeader for DownloadOptions {
    const NAME: &'static str = HEADER;

    fn to_header_value(&self) -> String {
        match self {
            Self::NoOpen => "noopen".to_string(),
        }
    }
}
