// Core HTTP model for the Armature JSON renderer
// This module contains the request/response types and the framework error

pub mod error;
pub mod headers;
pub mod http;
pub mod status;

// Re-export commonly used types
pub use error::*;
pub use headers::HeaderMap;
pub use http::*;
pub use status::*;
