//! Schema-directed JSON encoding.
//!
//! [`SchemaEncoder`] walks a [`Value`] alongside its [`TypeDescriptor`] and
//! writes compact JSON. The descriptor decides how scalars are written and,
//! with `require_types`, which parts of the value may be written at all.
//!
//! ## Flags
//!
//! | flag               | default | effect                                                  |
//! |--------------------|---------|---------------------------------------------------------|
//! | `ascii`            | on      | non-ASCII characters are written as `\uXXXX`            |
//! | `utf8`             | off     | raw UTF-8 is allowed even when the response charset is not UTF-8 |
//! | `canonical`        | off     | object keys are sorted                                  |
//! | `convert_blessed`  | off     | tagged values may supply their own representation       |
//! | `require_types`    | off     | every value must have a descriptor                      |
//! | `type_all_string`  | off     | scalars are coerced through their string form           |

use crate::descriptor::TypeDescriptor;
use crate::error::{RenderError, Result};
use crate::normalizer::ObjectNormalizer;
use crate::value::{Map, TaggedObject, Value};
use std::fmt::{self, Write as _};
use tracing::debug;

/// Deepest array/object nesting the encoder will write.
pub const MAX_DEPTH: usize = 512;

/// Encoding switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeFlags {
    pub ascii: bool,
    pub utf8: bool,
    pub canonical: bool,
    pub convert_blessed: bool,
    pub require_types: bool,
    pub type_all_string: bool,
}

impl Default for EncodeFlags {
    fn default() -> Self {
        Self {
            ascii: true,
            utf8: false,
            canonical: false,
            convert_blessed: false,
            require_types: false,
            type_all_string: false,
        }
    }
}

/// Whether a charset label names UTF-8
pub fn is_utf8_charset(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}

/// Encodes values against type descriptors.
#[derive(Debug, Clone, Default)]
pub struct SchemaEncoder {
    flags: EncodeFlags,
    normalizer: Option<ObjectNormalizer>,
}

impl SchemaEncoder {
    pub fn new(flags: EncodeFlags) -> Self {
        Self {
            flags,
            normalizer: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: ObjectNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn flags(&self) -> &EncodeFlags {
        &self.flags
    }

    pub fn normalizer(&self) -> Option<&ObjectNormalizer> {
        self.normalizer.as_ref()
    }

    /// Encode `value` against `descriptor`.
    pub fn encode(&self, value: &Value, descriptor: &TypeDescriptor) -> Result<Vec<u8>> {
        self.encode_inner(value, descriptor, self.flags.ascii)
    }

    /// Encode for a response declared with `charset`.
    ///
    /// Unless `utf8` is set, non-ASCII characters are escaped whenever the
    /// charset is not UTF-8, so the body stays valid in the declared charset.
    pub fn encode_for_charset(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
        charset: &str,
    ) -> Result<Vec<u8>> {
        let escape_non_ascii =
            self.flags.ascii || (!self.flags.utf8 && !is_utf8_charset(charset));
        self.encode_inner(value, descriptor, escape_non_ascii)
    }

    /// [`encode`](Self::encode) returning text
    pub fn encode_to_string(&self, value: &Value, descriptor: &TypeDescriptor) -> Result<String> {
        let mut writer = Writer::new(self, self.flags.ascii);
        writer.typed(value, Some(descriptor), &Path::Root)?;
        Ok(writer.out)
    }

    fn encode_inner(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
        escape_non_ascii: bool,
    ) -> Result<Vec<u8>> {
        let mut writer = Writer::new(self, escape_non_ascii);
        writer.typed(value, Some(descriptor), &Path::Root)?;
        debug!(bytes = writer.out.len(), "encoded JSON body");
        Ok(writer.out.into_bytes())
    }
}

/// Location of the value being encoded, formatted only on error.
#[derive(Clone, Copy)]
enum Path<'a> {
    Root,
    Key(&'a Path<'a>, &'a str),
    Index(&'a Path<'a>, usize),
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root => f.write_str("$"),
            Path::Key(parent, key) => write!(f, "{}.{}", parent, key),
            Path::Index(parent, index) => write!(f, "{}[{}]", parent, index),
        }
    }
}

struct Writer<'e> {
    flags: EncodeFlags,
    normalizer: Option<&'e ObjectNormalizer>,
    escape_non_ascii: bool,
    depth: usize,
    out: String,
}

impl<'e> Writer<'e> {
    fn new(encoder: &'e SchemaEncoder, escape_non_ascii: bool) -> Self {
        Self {
            flags: encoder.flags,
            normalizer: encoder.normalizer.as_ref(),
            escape_non_ascii,
            depth: 0,
            out: String::with_capacity(128),
        }
    }

    fn typed(
        &mut self,
        value: &Value,
        descriptor: Option<&TypeDescriptor>,
        path: &Path<'_>,
    ) -> Result<()> {
        if let Value::Tagged(object) = value {
            let plain = self.untag(object.as_ref(), descriptor, path)?;
            return self.typed(&plain, descriptor, path);
        }

        let descriptor = match descriptor {
            Some(TypeDescriptor::Any) => return self.inferred(value, path),
            Some(descriptor) => descriptor,
            None if self.flags.require_types => {
                return Err(RenderError::encoding(
                    path.to_string(),
                    format!("no type descriptor for {} value", value.kind()),
                ));
            }
            None => return self.inferred(value, path),
        };

        match (descriptor, value) {
            (_, Value::Null) => {
                self.out.push_str("null");
                Ok(())
            }
            (TypeDescriptor::Array(_) | TypeDescriptor::Tuple(_), Value::Array(items)) => {
                self.descend(path)?;
                self.out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.out.push(',');
                    }
                    let element = descriptor.element_type(index);
                    self.typed(item, element, &Path::Index(path, index))?;
                }
                self.out.push(']');
                self.depth -= 1;
                Ok(())
            }
            (TypeDescriptor::Object(fields), Value::Object(map)) => {
                self.descend(path)?;
                self.out.push('{');
                for (n, (key, item)) in ordered(map, self.flags.canonical).into_iter().enumerate() {
                    if n > 0 {
                        self.out.push(',');
                    }
                    self.string(key, path)?;
                    self.out.push(':');
                    self.typed(item, fields.get(key.as_str()), &Path::Key(path, key))?;
                }
                self.out.push('}');
                self.depth -= 1;
                Ok(())
            }
            (descriptor, value) if descriptor.is_scalar() => self.scalar(descriptor, value, path),
            (descriptor, value) => Err(mismatch(path, descriptor, value)),
        }
    }

    fn inferred(&mut self, value: &Value, path: &Path<'_>) -> Result<()> {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) if self.flags.type_all_string => self.string(bool_str(*b), path)?,
            Value::Bool(b) => self.out.push_str(bool_str(*b)),
            Value::Number(n) if self.flags.type_all_string => self.string(&n.to_string(), path)?,
            Value::Number(n) => self.out.push_str(&n.to_string()),
            Value::String(s) => self.string(s, path)?,
            Value::Array(items) => {
                self.descend(path)?;
                self.out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.out.push(',');
                    }
                    self.inferred(item, &Path::Index(path, index))?;
                }
                self.out.push(']');
                self.depth -= 1;
            }
            Value::Object(map) => {
                self.descend(path)?;
                self.out.push('{');
                for (n, (key, item)) in ordered(map, self.flags.canonical).into_iter().enumerate() {
                    if n > 0 {
                        self.out.push(',');
                    }
                    self.string(key, path)?;
                    self.out.push(':');
                    self.inferred(item, &Path::Key(path, key))?;
                }
                self.out.push('}');
                self.depth -= 1;
            }
            Value::Tagged(object) => {
                let plain = self.untag(object.as_ref(), None, path)?;
                self.inferred(&plain, path)?;
            }
        }
        Ok(())
    }

    fn scalar(&mut self, descriptor: &TypeDescriptor, value: &Value, path: &Path<'_>) -> Result<()> {
        let coerce = self.flags.type_all_string;

        match (descriptor, value) {
            (TypeDescriptor::String, Value::String(s)) => self.string(s, path)?,
            (TypeDescriptor::String, Value::Number(n)) if coerce => {
                self.string(&n.to_string(), path)?
            }
            (TypeDescriptor::String, Value::Bool(b)) if coerce => self.string(bool_str(*b), path)?,

            (TypeDescriptor::Number, Value::Number(n)) => self.out.push_str(&n.to_string()),
            (TypeDescriptor::Number, Value::String(s)) if coerce => {
                let n: serde_json::Number = serde_json::from_str(s.trim()).map_err(|_| {
                    RenderError::encoding(path.to_string(), format!("string {:?} is not a number", s))
                })?;
                self.out.push_str(&n.to_string());
            }

            (TypeDescriptor::Bool, Value::Bool(b)) => self.out.push_str(bool_str(*b)),
            (TypeDescriptor::Bool, Value::String(s)) if coerce && (s == "true" || s == "false") => {
                self.out.push_str(s)
            }

            (descriptor, value) => return Err(mismatch(path, descriptor, value)),
        }
        Ok(())
    }

    fn untag(
        &self,
        object: &dyn TaggedObject,
        descriptor: Option<&TypeDescriptor>,
        path: &Path<'_>,
    ) -> Result<Value> {
        let plain = if let Some(normalizer) = self.normalizer {
            normalizer.normalize(object, descriptor)?
        } else if self.flags.convert_blessed {
            object.to_json().ok_or_else(|| {
                RenderError::encoding(
                    path.to_string(),
                    format!("{} does not provide a JSON representation", object.type_name()),
                )
            })?
        } else {
            return Err(RenderError::encoding(
                path.to_string(),
                format!(
                    "cannot encode {} without a normalizer or convert_blessed",
                    object.type_name()
                ),
            ));
        };

        if let Value::Tagged(inner) = &plain {
            return Err(RenderError::encoding(
                path.to_string(),
                format!(
                    "converting {} produced another tagged value ({})",
                    object.type_name(),
                    inner.type_name()
                ),
            ));
        }
        Ok(plain)
    }

    fn descend(&mut self, path: &Path<'_>) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(RenderError::encoding(
                path.to_string(),
                format!("maximum nesting depth {} exceeded", MAX_DEPTH),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Quoting and control characters follow serde_json; only the
    /// non-ASCII pass is done here.
    fn string(&mut self, s: &str, path: &Path<'_>) -> Result<()> {
        let quoted = serde_json::to_string(s)
            .map_err(|e| RenderError::encoding(path.to_string(), e.to_string()))?;

        if !self.escape_non_ascii || quoted.is_ascii() {
            self.out.push_str(&quoted);
            return Ok(());
        }

        for c in quoted.chars() {
            if c.is_ascii() {
                self.out.push(c);
                continue;
            }
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                // Writing to a String cannot fail
                let _ = write!(self.out, "\\u{:04x}", unit);
            }
        }
        Ok(())
    }
}

fn ordered(map: &Map, canonical: bool) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    if canonical {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

fn mismatch(path: &Path<'_>, descriptor: &TypeDescriptor, value: &Value) -> RenderError {
    RenderError::encoding(
        path.to_string(),
        format!("expected {}, found {}", descriptor.kind(), value.kind()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(flags: EncodeFlags, value: serde_json::Value, desc: &TypeDescriptor) -> Result<String> {
        SchemaEncoder::new(flags).encode_to_string(&Value::from(value), desc)
    }

    #[derive(Debug)]
    struct Temperature(f64);

    impl TaggedObject for Temperature {
        fn type_name(&self) -> &str {
            "Temperature"
        }

        fn fields(&self) -> Value {
            [("celsius", Value::from(self.0))].into_iter().collect()
        }

        fn to_json(&self) -> Option<Value> {
            Some(Value::from(format!("{}C", self.0)))
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl TaggedObject for Opaque {
        fn type_name(&self) -> &str {
            "Opaque"
        }

        fn fields(&self) -> Value {
            Value::Null
        }
    }

    #[test]
    fn test_typed_object() {
        let desc = TypeDescriptor::object()
            .field("id", TypeDescriptor::Number)
            .field("name", TypeDescriptor::String)
            .field("tags", TypeDescriptor::array_of(TypeDescriptor::String));

        let out = encode(
            EncodeFlags::default(),
            json!({"id": 7, "name": "ann", "tags": ["a", "b"]}),
            &desc,
        )
        .unwrap();
        assert_eq!(out, r#"{"id":7,"name":"ann","tags":["a","b"]}"#);
    }

    #[test]
    fn test_insertion_order_without_canonical() {
        let out = encode(EncodeFlags::default(), json!({"b": 1, "a": 2}), &TypeDescriptor::Any)
            .unwrap();
        assert_eq!(out, r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn test_canonical_sorts_keys() {
        let flags = EncodeFlags {
            canonical: true,
            ..Default::default()
        };
        let out = encode(flags, json!({"b": {"y": 1, "x": 2}, "a": 2}), &TypeDescriptor::Any)
            .unwrap();
        assert_eq!(out, r#"{"a":2,"b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn test_ascii_escapes_non_ascii() {
        let out = encode(EncodeFlags::default(), json!("é😀"), &TypeDescriptor::String).unwrap();
        assert_eq!(out, "\"\\u00e9\\ud83d\\ude00\"");
    }

    #[test]
    fn test_raw_utf8_without_ascii() {
        let flags = EncodeFlags {
            ascii: false,
            ..Default::default()
        };
        let out = encode(flags, json!("é"), &TypeDescriptor::String).unwrap();
        assert_eq!(out, "\"é\"");
    }

    #[test]
    fn test_charset_forces_ascii_unless_utf8() {
        let value = Value::from("é");
        let flags = EncodeFlags {
            ascii: false,
            ..Default::default()
        };

        let encoder = SchemaEncoder::new(flags);
        let latin = encoder
            .encode_for_charset(&value, &TypeDescriptor::String, "ISO-8859-1")
            .unwrap();
        assert_eq!(latin, b"\"\\u00e9\"".to_vec());

        let utf8 = encoder
            .encode_for_charset(&value, &TypeDescriptor::String, "UTF-8")
            .unwrap();
        assert_eq!(utf8, "\"é\"".as_bytes().to_vec());

        let forced = SchemaEncoder::new(EncodeFlags { utf8: true, ..flags })
            .encode_for_charset(&value, &TypeDescriptor::String, "ISO-8859-1")
            .unwrap();
        assert_eq!(forced, "\"é\"".as_bytes().to_vec());
    }

    #[test]
    fn test_control_characters() {
        let out = encode(
            EncodeFlags::default(),
            json!("a\"b\\c\nd\u{0001}"),
            &TypeDescriptor::String,
        )
        .unwrap();
        assert_eq!(out, "\"a\\\"b\\\\c\\nd\\u0001\"");
    }

    #[test]
    fn test_require_types_missing_field() {
        let desc = TypeDescriptor::object().field("a", TypeDescriptor::String);
        let value = json!({"a": "x", "b": 1});

        let strict = EncodeFlags {
            require_types: true,
            ..Default::default()
        };
        let err = encode(strict, value.clone(), &desc).unwrap_err();
        assert!(err.is_encoding());
        assert_eq!(err.to_string(), "Encoding error at $.b: no type descriptor for number value");

        let out = encode(EncodeFlags::default(), value, &desc).unwrap();
        assert_eq!(out, r#"{"a":"x","b":1}"#);
    }

    #[test]
    fn test_require_types_satisfied_by_any() {
        let strict = EncodeFlags {
            require_types: true,
            ..Default::default()
        };
        let desc = TypeDescriptor::object().field("meta", TypeDescriptor::Any);
        let out = encode(strict, json!({"meta": {"x": [1, 2]}}), &desc).unwrap();
        assert_eq!(out, r#"{"meta":{"x":[1,2]}}"#);
    }

    #[test]
    fn test_tuple_require_types_index_path() {
        let strict = EncodeFlags {
            require_types: true,
            ..Default::default()
        };
        let desc = TypeDescriptor::object().field("p", TypeDescriptor::tuple(vec![TypeDescriptor::Number]));
        let err = encode(strict, json!({"p": [1, 2]}), &desc).unwrap_err();
        assert!(err.to_string().contains("$.p[1]"));
    }

    #[test]
    fn test_compound_against_scalar_fails() {
        let desc = TypeDescriptor::object().field("a", TypeDescriptor::String);
        let err = encode(EncodeFlags::default(), json!({"a": {"nested": true}}), &desc).unwrap_err();
        assert_eq!(err.to_string(), "Encoding error at $.a: expected string, found object");

        let flags = EncodeFlags {
            type_all_string: true,
            ..Default::default()
        };
        assert!(encode(flags, json!({"a": [1]}), &desc).is_err());
    }

    #[test]
    fn test_scalar_mismatch_without_coercion() {
        let err = encode(EncodeFlags::default(), json!(5), &TypeDescriptor::String).unwrap_err();
        assert!(err.to_string().contains("expected string, found number"));
        assert!(encode(EncodeFlags::default(), json!("5"), &TypeDescriptor::Number).is_err());
    }

    #[test]
    fn test_type_all_string_coercion() {
        let flags = EncodeFlags {
            type_all_string: true,
            ..Default::default()
        };
        let desc = TypeDescriptor::object()
            .field("s", TypeDescriptor::String)
            .field("n", TypeDescriptor::Number)
            .field("b", TypeDescriptor::Bool);

        let out = encode(flags, json!({"s": 12, "n": " 3.5 ", "b": "true", "x": false}), &desc)
            .unwrap();
        assert_eq!(out, r#"{"s":"12","n":3.5,"b":true,"x":"false"}"#);

        assert!(encode(flags, json!({"n": "abc"}), &desc).is_err());
    }

    #[test]
    fn test_null_satisfies_any_descriptor() {
        let desc = TypeDescriptor::object()
            .field("s", TypeDescriptor::String)
            .field("o", TypeDescriptor::object());
        let out = encode(EncodeFlags::default(), json!({"s": null, "o": null}), &desc).unwrap();
        assert_eq!(out, r#"{"s":null,"o":null}"#);
    }

    #[test]
    fn test_null_descriptor_rejects_values() {
        assert!(encode(EncodeFlags::default(), json!(1), &TypeDescriptor::Null).is_err());
    }

    #[test]
    fn test_tagged_requires_conversion() {
        let value = Value::tagged(Opaque);
        let err = SchemaEncoder::default()
            .encode(&value, &TypeDescriptor::Any)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encoding error at $: cannot encode Opaque without a normalizer or convert_blessed"
        );
    }

    #[test]
    fn test_convert_blessed_uses_own_representation() {
        let flags = EncodeFlags {
            convert_blessed: true,
            ..Default::default()
        };
        let value: Value = [("t", Value::tagged(Temperature(21.5)))].into_iter().collect();
        let out = SchemaEncoder::new(flags)
            .encode_to_string(&value, &TypeDescriptor::Any)
            .unwrap();
        assert_eq!(out, r#"{"t":"21.5C"}"#);

        let err = SchemaEncoder::new(flags)
            .encode(&Value::tagged(Opaque), &TypeDescriptor::Any)
            .unwrap_err();
        assert!(err.to_string().contains("Opaque does not provide a JSON representation"));
    }

    #[test]
    fn test_normalizer_preferred_and_descriptor_applied() {
        let encoder = SchemaEncoder::new(EncodeFlags {
            convert_blessed: true,
            ..Default::default()
        })
        .with_normalizer(ObjectNormalizer::unbless());

        let desc = TypeDescriptor::object().field(
            "t",
            TypeDescriptor::object().field("celsius", TypeDescriptor::Number),
        );
        let value: Value = [("t", Value::tagged(Temperature(3.0)))].into_iter().collect();
        let out = encoder.encode_to_string(&value, &desc).unwrap();
        assert_eq!(out, r#"{"t":{"celsius":3.0}}"#);
    }

    #[test]
    fn test_normalizer_returning_tagged_fails() {
        let encoder = SchemaEncoder::default()
            .with_normalizer(ObjectNormalizer::new(|_, _| Ok(Value::tagged(Opaque))));
        let err = encoder
            .encode(&Value::tagged(Opaque), &TypeDescriptor::Any)
            .unwrap_err();
        assert!(err.to_string().contains("produced another tagged value"));
    }

    #[test]
    fn test_deterministic_canonical_output() {
        let encoder = SchemaEncoder::new(EncodeFlags {
            canonical: true,
            ..Default::default()
        });
        let value = Value::from(json!({"z": [1, {"q": 1, "p": 2}], "m": "x", "a": null}));
        let first = encoder.encode(&value, &TypeDescriptor::Any).unwrap();
        let second = encoder.encode(&value, &TypeDescriptor::Any).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, br#"{"a":null,"m":"x","z":[1,{"p":2,"q":1}]}"#.to_vec());
    }

    fn nested(depth: usize) -> Value {
        (0..depth).fold(Value::Null, |inner, _| Value::Array(vec![inner]))
    }

    #[test]
    fn test_nesting_at_max_depth() {
        let out = SchemaEncoder::default()
            .encode_to_string(&nested(MAX_DEPTH), &TypeDescriptor::Any)
            .unwrap();
        assert_eq!(out.len(), MAX_DEPTH * 2 + 4);
        assert!(out.starts_with("[[") && out.ends_with("null]]"));
    }

    #[test]
    fn test_nesting_beyond_max_depth_fails() {
        let err = SchemaEncoder::default()
            .encode(&nested(MAX_DEPTH + 1), &TypeDescriptor::Any)
            .unwrap_err();
        assert!(err.is_encoding());
        assert!(err.to_string().contains("maximum nesting depth 512 exceeded"));
    }

    #[test]
    fn test_typed_and_inferred_share_depth() {
        // the outer array is typed, everything below is inferred
        let desc = TypeDescriptor::array_of(TypeDescriptor::Any);
        let encoder = SchemaEncoder::default();
        assert!(encoder.encode(&nested(MAX_DEPTH), &desc).is_ok());
        assert!(encoder.encode(&nested(MAX_DEPTH + 1), &desc).is_err());

        let wide = Value::Array((0..MAX_DEPTH * 4).map(|_| nested(8)).collect());
        assert!(encoder.encode(&wide, &desc).is_ok());
    }

    #[test]
    fn test_raw_and_ascii_modes_quote_alike() {
        let text = "tab\there \"q\" back\\slash \u{0008}\u{000c}\u{001f} zoë";
        let raw = encode(
            EncodeFlags {
                ascii: false,
                ..Default::default()
            },
            json!(text),
            &TypeDescriptor::String,
        )
        .unwrap();
        assert_eq!(raw, serde_json::to_string(text).unwrap());

        let ascii = encode(EncodeFlags::default(), json!(text), &TypeDescriptor::String).unwrap();
        assert_eq!(ascii, raw.replace('ë', "\\u00eb"));
    }
}
