//! render_json Benchmarks
//!
//! Measures the encoder, the escape filter and the full render pipeline.
//!
//! Run benchmarks:
//!   cargo bench --bench render_benchmarks

use armature_render_json::prelude::*;
use armature_render_json::{EscapeFilter, SchemaEncoder};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;

// ============================================================================
// Test Data
// ============================================================================

fn small_payload() -> Value {
    Value::from(json!({"id": 1, "name": "ann", "active": true}))
}

fn large_payload() -> Value {
    let posts: Vec<_> = (0..100)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Post <{}> + more", i),
                "tags": ["rust", "json", "web"],
                "score": i as f64 * 1.5
            })
        })
        .collect();
    Value::from(json!({"user": "ann", "bio": "Zoë writes é and 🦀", "posts": posts}))
}

fn large_descriptor() -> TypeDescriptor {
    TypeDescriptor::from_json(&json!({
        "user": "string",
        "bio": "string",
        "posts": [{"id": "number", "title": "string", "tags": ["string"], "score": "number"}]
    }))
    .unwrap()
}

// ============================================================================
// Encoding
// ============================================================================

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let small = small_payload();
    let large = large_payload();
    let descriptor = large_descriptor();

    let encoder = SchemaEncoder::default();
    let strict = SchemaEncoder::new(EncodeFlags {
        require_types: true,
        ..Default::default()
    });
    let canonical = SchemaEncoder::new(EncodeFlags {
        canonical: true,
        ..Default::default()
    });

    group.bench_function("small/inferred", |b| {
        b.iter(|| encoder.encode(black_box(&small), &TypeDescriptor::Any))
    });

    let size = encoder.encode(&large, &descriptor).map(|b| b.len()).unwrap_or(0);
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("large/typed", |b| {
        b.iter(|| encoder.encode(black_box(&large), &descriptor))
    });
    group.bench_function("large/require_types", |b| {
        b.iter(|| strict.encode(black_box(&large), &descriptor))
    });
    group.bench_function("large/canonical", |b| {
        b.iter(|| canonical.encode(black_box(&large), &TypeDescriptor::Any))
    });

    group.finish();
}

// ============================================================================
// Escaping
// ============================================================================

fn bench_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape");
    let filter = EscapeFilter::default();

    let clean = br#"{"message":"nothing to replace in this body at all"}"#.repeat(64);
    let dirty = br#"{"html":"<b>1+1</b>","cmp":"a>b"}"#.repeat(64);

    group.throughput(Throughput::Bytes(clean.len() as u64));
    group.bench_function("clean", |b| b.iter(|| filter.escape(black_box(&clean))));

    group.throughput(Throughput::Bytes(dirty.len() as u64));
    group.bench_function("dirty", |b| b.iter(|| filter.escape(black_box(&dirty))));

    group.finish();
}

// ============================================================================
// Full Pipeline
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let large = large_payload();
    let descriptor = large_descriptor();
    let request = HttpRequest::new(HttpMethod::GET, "/api/posts")
        .with_header("User-Agent", "bench")
        .with_header("Cookie", "sid=1");

    let defaults = JsonRenderer::default();
    let hardened = JsonRenderer::from_options(
        RenderJsonOptions::new()
            .defence_json_hijacking_for_legacy_browser(true)
            .status_code_field("status"),
    );

    group.bench_function("defaults", |b| {
        b.iter(|| defaults.render_ok(&RenderContext::new(&request), black_box(&large), &descriptor))
    });
    group.bench_function("hardened", |b| {
        b.iter(|| hardened.render_ok(&RenderContext::new(&request), black_box(&large), &descriptor))
    });

    group.finish();
}

criterion_group!(render_benches, bench_encoding, bench_escaping, bench_render);

criterion_main!(render_benches);
