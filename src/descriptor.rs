//! Type descriptors: the declared JSON shape of a rendered value.
//!
//! Descriptors can be built in code:
//!
//! ```
//! use armature_render_json::TypeDescriptor;
//!
//! let user = TypeDescriptor::object()
//!     .field("id", TypeDescriptor::Number)
//!     .field("name", TypeDescriptor::String)
//!     .field("tags", TypeDescriptor::array_of(TypeDescriptor::String));
//! ```
//!
//! or parsed from a compact JSON notation, which is also how descriptors
//! appear in configuration files:
//!
//! ```
//! use armature_render_json::TypeDescriptor;
//! use serde_json::json;
//!
//! let user = TypeDescriptor::from_json(&json!({
//!     "id": "number",
//!     "name": "string",
//!     "tags": ["string"],
//!     "point": {"tuple": ["number", "number"]}
//! })).unwrap();
//! assert!(user.field_type("tags").is_some());
//! ```

use crate::error::{RenderError, Result};
use indexmap::IndexMap;
use serde::Deserialize;

/// Declared shape of a value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum TypeDescriptor {
    /// Shape is inferred from the value; satisfies `require_types` for the
    /// whole subtree
    Any,
    String,
    Number,
    Bool,
    Null,
    /// Every element has the same descriptor
    Array(Box<TypeDescriptor>),
    /// One descriptor per index
    Tuple(Vec<TypeDescriptor>),
    /// Field descriptors by key
    Object(IndexMap<String, TypeDescriptor>),
}

impl TypeDescriptor {
    /// An object descriptor with no fields yet
    pub fn object() -> Self {
        TypeDescriptor::Object(IndexMap::new())
    }

    pub fn array_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn tuple(elements: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Tuple(elements)
    }

    /// Add a field. Calling this on a non-object descriptor replaces it with
    /// an object descriptor holding only the new field.
    pub fn field(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        let mut fields = match self {
            TypeDescriptor::Object(fields) => fields,
            _ => IndexMap::new(),
        };
        fields.insert(name.into(), descriptor);
        TypeDescriptor::Object(fields)
    }

    /// Descriptor of an object field
    pub fn field_type(&self, name: &str) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Descriptor of an array element at `index`
    pub fn element_type(&self, index: usize) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(element) => Some(element),
            TypeDescriptor::Tuple(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Whether this descriptor declares a scalar kind
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::String | TypeDescriptor::Number | TypeDescriptor::Bool | TypeDescriptor::Null
        )
    }

    /// Short name of the declared kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            TypeDescriptor::Any => "any",
            TypeDescriptor::String => "string",
            TypeDescriptor::Number => "number",
            TypeDescriptor::Bool => "boolean",
            TypeDescriptor::Null => "null",
            TypeDescriptor::Array(_) | TypeDescriptor::Tuple(_) => "array",
            TypeDescriptor::Object(_) => "object",
        }
    }

    /// Parse the compact JSON notation.
    ///
    /// | notation                 | descriptor        |
    /// |--------------------------|-------------------|
    /// | `"string"`               | `String`          |
    /// | `"number"`, `"int"`, `"float"` | `Number`    |
    /// | `"bool"`, `"boolean"`    | `Bool`            |
    /// | `"null"`                 | `Null`            |
    /// | `"any"`                  | `Any`             |
    /// | `[d]`                    | `Array(d)`        |
    /// | `{"tuple": [d, ...]}`    | `Tuple`           |
    /// | `{"k": d, ...}`          | `Object`          |
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(marker) => Self::from_marker(marker),
            serde_json::Value::Array(items) => match items.as_slice() {
                [element] => Ok(Self::array_of(Self::from_json(element)?)),
                _ => Err(RenderError::InvalidDescriptor(format!(
                    "array notation takes exactly one element descriptor, got {}",
                    items.len()
                ))),
            },
            serde_json::Value::Object(map) => {
                if let (1, Some(serde_json::Value::Array(items))) = (map.len(), map.get("tuple")) {
                    let elements = items.iter().map(Self::from_json).collect::<Result<_>>()?;
                    return Ok(Self::tuple(elements));
                }
                let mut fields = IndexMap::with_capacity(map.len());
                for (name, descriptor) in map {
                    fields.insert(name.clone(), Self::from_json(descriptor)?);
                }
                Ok(TypeDescriptor::Object(fields))
            }
            other => Err(RenderError::InvalidDescriptor(format!(
                "expected a string, array or object, got {}",
                other
            ))),
        }
    }

    fn from_marker(marker: &str) -> Result<Self> {
        match marker.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(TypeDescriptor::String),
            "number" | "int" | "integer" | "float" => Ok(TypeDescriptor::Number),
            "bool" | "boolean" => Ok(TypeDescriptor::Bool),
            "null" => Ok(TypeDescriptor::Null),
            "any" => Ok(TypeDescriptor::Any),
            other => Err(RenderError::InvalidDescriptor(format!(
                "unknown type marker '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<serde_json::Value> for TypeDescriptor {
    type Error = RenderError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_json(&value)
    }
}
