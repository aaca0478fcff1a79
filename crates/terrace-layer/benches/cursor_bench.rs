//! # Cursor Benchmarks
//!
//! Effective-view iteration over layer stacks of increasing depth.
//!
//! Run with: `cargo bench -p terrace-layer`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use terrace_layer::{Layer, LayerBuilder};

/// Build `depth` layers on a base of `width` triples. Each child adds a new
/// triple and removes one inherited from the base.
fn create_stack(width: usize, depth: usize) -> Layer {
    let mut builder = LayerBuilder::base();
    for i in 0..width {
        builder
            .add_string_node_triple(&format!("s{i}"), "p", &format!("o{i}"))
            .expect("add");
    }
    let mut layer = builder.commit().expect("commit");

    for d in 0..depth {
        let mut builder = layer.open_write();
        builder
            .add_string_node_triple(&format!("extra{d}"), "p", "o0")
            .expect("add");
        builder
            .remove_string_node_triple(&format!("s{d}"), "p", &format!("o{d}"))
            .expect("remove");
        layer = builder.commit().expect("commit");
    }
    layer
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");

    for depth in [0, 8, 64].iter() {
        let layer = create_stack(1000, *depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &layer, |b, layer| {
            b.iter(|| black_box(layer.triples().count()));
        });
    }

    group.finish();
}

fn bench_subject_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("subject_enumeration");

    for depth in [0, 8, 64].iter() {
        let layer = create_stack(1000, *depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &layer, |b, layer| {
            b.iter(|| black_box(layer.subjects().count()));
        });
    }

    group.finish();
}

fn bench_object_lookup(c: &mut Criterion) {
    let layer = create_stack(1000, 64);
    let object = layer.object_node_id("o0").expect("object id");

    c.bench_function("object_lookup", |b| {
        b.iter(|| {
            let lookup = layer.lookup_object(black_box(object));
            black_box(lookup.map(|l| l.subject_predicate_pairs().count()))
        });
    });
}

criterion_group!(
    benches,
    bench_full_scan,
    bench_subject_enumeration,
    bench_object_lookup,
);

criterion_main!(benches);
