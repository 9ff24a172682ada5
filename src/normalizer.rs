//! Conversion of tagged domain objects into plain values.

use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::value::{TaggedObject, Value};
use std::fmt;
use std::sync::Arc;

type NormalizeFn =
    dyn Fn(&dyn TaggedObject, Option<&TypeDescriptor>) -> Result<Value> + Send + Sync;

/// Externally supplied normalizer for tagged values.
///
/// The encoder calls it for every [`Value::Tagged`] it meets, passing the
/// descriptor declared at that position. The returned value is encoded in
/// place of the tagged one and must itself be plain.
///
/// ```
/// use armature_render_json::{ObjectNormalizer, Value};
///
/// // Render every tagged object as its type name
/// let normalizer = ObjectNormalizer::new(|object, _descriptor| {
///     Ok(Value::from(object.type_name()))
/// });
/// ```
#[derive(Clone)]
pub struct ObjectNormalizer {
    normalize: Arc<NormalizeFn>,
}

impl ObjectNormalizer {
    pub fn new<F>(normalize: F) -> Self
    where
        F: Fn(&dyn TaggedObject, Option<&TypeDescriptor>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            normalize: Arc::new(normalize),
        }
    }

    /// Strip the tag and keep the plain data underneath
    pub fn unbless() -> Self {
        Self::new(|object, _| Ok(object.fields()))
    }

    pub fn normalize(
        &self,
        object: &dyn TaggedObject,
        descriptor: Option<&TypeDescriptor>,
    ) -> Result<Value> {
        (self.normalize)(object, descriptor)
    }
}

impl fmt::Debug for ObjectNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectNormalizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[derive(Debug)]
    struct Money {
        cents: i64,
    }

    impl TaggedObject for Money {
        fn type_name(&self) -> &str {
            "Money"
        }

        fn fields(&self) -> Value {
            [("cents", self.cents)].into_iter().collect()
        }
    }

    #[test]
    fn test_unbless_returns_fields() {
        let plain = ObjectNormalizer::unbless()
            .normalize(&Money { cents: 250 }, None)
            .unwrap();
        assert_eq!(plain.get("cents"), Some(&Value::from(250)));
    }

    #[test]
    fn test_custom_normalizer_sees_descriptor() {
        let normalizer = ObjectNormalizer::new(|object, descriptor| match descriptor {
            Some(TypeDescriptor::String) => Ok(Value::from(object.type_name())),
            _ => Err(RenderError::encoding("$", "string descriptor required")),
        });

        let money = Money { cents: 1 };
        assert_eq!(
            normalizer
                .normalize(&money, Some(&TypeDescriptor::String))
                .unwrap(),
            Value::from("Money")
        );
        assert!(normalizer.normalize(&money, None).is_err());
    }
}
