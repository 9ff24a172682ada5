//! The `render_json` pipeline.

use crate::config::{RenderJsonConfig, RenderJsonOptions};
use crate::descriptor::TypeDescriptor;
use crate::encoder::{EncodeFlags, SchemaEncoder};
use crate::error::Result;
use crate::validator::RequestValidator;
use crate::value::Value;
use armature_core::{HttpRequest, HttpResponse, HttpStatus};
use std::sync::Arc;
use tracing::{debug, warn};

/// Text encoding assumed when the host does not declare one
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Header mirroring the value's status field
pub const API_STATUS_HEADER: &str = "X-API-Status";

/// Per-call rendering context: the inbound request and the response text
/// encoding.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    request: &'a HttpRequest,
    encoding: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn new(request: &'a HttpRequest) -> Self {
        Self {
            request,
            encoding: DEFAULT_ENCODING,
        }
    }

    pub fn with_encoding(mut self, encoding: &'a str) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn request(&self) -> &'a HttpRequest {
        self.request
    }

    pub fn encoding(&self) -> &'a str {
        self.encoding
    }
}

/// Capability to render a value as a JSON response.
///
/// Hosts hand this to request handlers; [`JsonRenderer`] is the standard
/// implementation.
pub trait RenderJson {
    fn render_json(
        &self,
        ctx: &RenderContext<'_>,
        value: &Value,
        descriptor: &TypeDescriptor,
        status: u16,
    ) -> Result<HttpResponse>;
}

/// Renders values into JSON responses using one resolved configuration.
///
/// Cloning is cheap; clones share the configuration.
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    config: Arc<RenderJsonConfig>,
    encoder: SchemaEncoder,
    validator: RequestValidator,
}

impl JsonRenderer {
    pub fn new(config: RenderJsonConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<RenderJsonConfig>) -> Self {
        Self {
            encoder: config.encoder(),
            validator: config.validator(),
            config,
        }
    }

    pub fn from_options(options: RenderJsonOptions) -> Self {
        Self::new(options.resolve())
    }

    pub fn config(&self) -> &RenderJsonConfig {
        &self.config
    }

    /// Name the renderer is installed under
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Render with status 200
    pub fn render_ok(
        &self,
        ctx: &RenderContext<'_>,
        value: &Value,
        descriptor: &TypeDescriptor,
    ) -> Result<HttpResponse> {
        self.render(ctx, value, descriptor, HttpStatus::Ok.code())
    }

    /// Render `value` as a JSON response.
    ///
    /// Returns the rejection response unchanged if the hijacking defence
    /// rejects the request. Encoding failures are returned as errors and no
    /// response is built.
    pub fn render(
        &self,
        ctx: &RenderContext<'_>,
        value: &Value,
        descriptor: &TypeDescriptor,
        status: u16,
    ) -> Result<HttpResponse> {
        if let Some(rejection) = self.validator.validate(ctx.request()) {
            return Ok(rejection);
        }

        let body = self
            .encoder
            .encode_for_charset(value, descriptor, ctx.encoding())
            .inspect_err(|e| warn!(error = %e, path = %ctx.request().path, "failed to encode JSON response"))?;

        let body = match &self.config.escape_filter {
            Some(filter) => filter.escape(&body),
            None => body,
        };

        let mut response = HttpResponse::new(status);
        response.headers.set_content_type(format!(
            "application/json; charset={}",
            ctx.encoding().to_lowercase()
        ));
        response.set_body(body);

        if let Some(secure_headers) = &self.config.secure_headers {
            secure_headers.apply_to(&mut response.headers);
        }

        if let Some(field) = &self.config.status_code_field {
            if let Some(api_status) = value.get(field).and_then(status_header_value) {
                response.headers.insert(API_STATUS_HEADER, api_status);
            }
        }

        debug!(
            status,
            bytes = response.body.len(),
            "rendered JSON response"
        );
        Ok(response)
    }
}

impl RenderJson for JsonRenderer {
    fn render_json(
        &self,
        ctx: &RenderContext<'_>,
        value: &Value,
        descriptor: &TypeDescriptor,
        status: u16,
    ) -> Result<HttpResponse> {
        self.render(ctx, value, descriptor, status)
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new(RenderJsonConfig::default())
    }
}

/// Header text for a status field: strings as-is, everything else as JSON.
///
/// Strings carrying control characters (CR/LF included) are never mirrored.
fn status_header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.chars().any(char::is_control) => {
            debug!(field = %s.escape_debug(), "status field has control characters; not mirrored");
            None
        }
        Value::String(s) => Some(s.clone()),
        Value::Tagged(object) => {
            debug!(type_name = object.type_name(), "status field is a tagged value; not mirrored");
            None
        }
        other => SchemaEncoder::new(EncodeFlags::default())
            .encode_to_string(other, &TypeDescriptor::Any)
            .ok(),
    }
}
