// Armature JSON renderer - typed, hardened JSON responses
//
// Renders values against declared type descriptors, escapes characters that
// are dangerous when JSON is reflected into HTML, adds security headers, and
// optionally rejects legacy-browser JSON hijacking requests.
//
// ```
// use armature_render_json::prelude::*;
// use serde_json::json;
//
// let renderer = JsonRenderer::from_options(RenderJsonOptions::new().status_code_field("status"));
//
// let request = HttpRequest::new(HttpMethod::GET, "/users/7");
// let user = TypeDescriptor::object()
//     .field("status", TypeDescriptor::Number)
//     .field("name", TypeDescriptor::String);
//
// let response = renderer
//     .render_ok(&RenderContext::new(&request), &Value::from(json!({"status": 200, "name": "<ann>"})), &user)
//     .unwrap();
//
// assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
// assert_eq!(response.headers.get("X-API-Status").map(String::as_str), Some("200"));
// ```

pub mod config;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod normalizer;
pub mod registry;
pub mod renderer;
pub mod validator;
pub mod value;

pub use config::{
    DEFAULT_METHOD_NAME, Entry, EntryTable, FileFormat, RenderJsonConfig, RenderJsonOptions,
    Section,
};
pub use descriptor::TypeDescriptor;
pub use encoder::{EncodeFlags, SchemaEncoder, is_utf8_charset};
pub use error::{RenderError, Result};
pub use escape::{DEFAULT_ESCAPES, EscapeEntry, EscapeFilter};
pub use normalizer::ObjectNormalizer;
pub use registry::RendererRegistry;
pub use renderer::{API_STATUS_HEADER, DEFAULT_ENCODING, JsonRenderer, RenderContext, RenderJson};
pub use validator::{REJECTION_BODY, RequestValidator};
pub use value::{Map, TaggedObject, Value};

// Re-export the crates whose types appear in this API
pub use armature_core;
pub use armature_security;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        EncodeFlags, JsonRenderer, ObjectNormalizer, RenderContext, RenderError, RenderJson,
        RenderJsonConfig, RenderJsonOptions, RendererRegistry, TaggedObject, TypeDescriptor,
        Value,
    };
    pub use armature_core::{HttpMethod, HttpRequest, HttpResponse};
    pub use armature_security::SecureHeaders;
}
