//! Property tests for the render pipeline.

use armature_render_json::prelude::*;
use armature_render_json::{EscapeFilter, SchemaEncoder};
use proptest::prelude::*;

// Strategy: arbitrary JSON-like values a few levels deep
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::from),
        "\\PC{0,8}".prop_map(Value::from),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z<>+]{1,6}", inner), 0..6)
                .prop_map(|entries| entries.into_iter().collect::<Value>()),
        ]
    })
}

proptest! {
    /// Property: text without trigger characters passes through unchanged
    #[test]
    fn proptest_escape_identity_without_triggers(input in "[^+<>]{0,64}") {
        let filter = EscapeFilter::default();
        prop_assert_eq!(filter.escape_str(&input), input);
    }

    /// Property: escaped output contains no enabled trigger character
    #[test]
    fn proptest_escape_removes_triggers(input in "\\PC{0,64}") {
        let escaped = EscapeFilter::default().escape_str(&input);
        prop_assert!(!escaped.contains(['+', '<', '>']));

        // Replacements contain no triggers, so escaping again changes nothing
        prop_assert_eq!(EscapeFilter::default().escape_str(&escaped), escaped.clone());
    }

    /// Property: Content-Length always equals the body length
    #[test]
    fn proptest_content_length_matches_body(value in arb_value(), ascii in any::<bool>()) {
        let renderer = JsonRenderer::from_options(RenderJsonOptions::new().ascii(ascii));
        let request = HttpRequest::new(HttpMethod::GET, "/");

        let response = renderer
            .render_ok(&RenderContext::new(&request), &value, &TypeDescriptor::Any)
            .unwrap();
        prop_assert_eq!(response.content_length(), Some(response.body.len()));
    }

    /// Property: canonical encoding is deterministic and independent of key order
    #[test]
    fn proptest_canonical_is_deterministic(value in arb_value()) {
        let encoder = SchemaEncoder::new(EncodeFlags { canonical: true, ..Default::default() });

        let first = encoder.encode(&value, &TypeDescriptor::Any).unwrap();
        let second = encoder.encode(&value, &TypeDescriptor::Any).unwrap();
        prop_assert_eq!(&first, &second);

        let reversed = reverse_keys(&value);
        let third = encoder.encode(&reversed, &TypeDescriptor::Any).unwrap();
        prop_assert_eq!(first, third);
    }

    /// Property: encoder output is valid JSON matching the input
    #[test]
    fn proptest_output_parses_back(value in arb_value()) {
        let body = SchemaEncoder::default().encode(&value, &TypeDescriptor::Any).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        prop_assert_eq!(Value::from(parsed), value);
    }
}

fn reverse_keys(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(reverse_keys).collect()),
        Value::Object(map) => map
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), reverse_keys(v)))
            .collect(),
        other => other.clone(),
    }
}
