use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use humanify::engine::{self, grouper, merger, scope::Arena};
use humanify::parser::SourceTree;

fn generate_source(function_count: usize) -> String {
    let mut s = String::new();
    for i in 0..function_count {
        s.push_str(&format!(
            "function f{i}(a,b,c){{var t=a+b;for(var j=0;j<c;j++){{t=t+j;}}return t;}}\n"
        ));
    }
    s
}

fn analyze_source(source: &str) -> Arena {
    let tree = SourceTree::parse("bench.js", source).unwrap_or_else(|e| panic!("parse failed: {e}"));
    engine::analyzer::analyze(tree.program())
}

fn bench_analyzer(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyzer");
    for size in [10, 100, 1_000] {
        let source = generate_source(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let tree = SourceTree::parse("bench.js", black_box(source)).unwrap_or_else(|e| panic!("parse failed: {e}"));
                black_box(engine::analyzer::analyze(tree.program()))
            });
        });
    }
    group.finish();
}

fn bench_grouping_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_pipeline");
    for size in [10, 100, 1_000] {
        let source = generate_source(size);
        let arena = analyze_source(&source);
        group.throughput(Throughput::Elements(arena.bindings.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &(source, arena), |b, (source, arena)| {
            b.iter(|| {
                let groups = grouper::group(black_box(arena));
                black_box(merger::merge_small_scopes(source, arena, groups, 2, 10))
            });
        });
    }
    group.finish();
}

fn bench_print_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("print_round_trip");
    for size in [10, 100, 1_000] {
        let source = generate_source(size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let tree = SourceTree::parse("bench.js", black_box(source)).unwrap_or_else(|e| panic!("parse failed: {e}"));
                black_box(tree.print().unwrap_or_else(|e| panic!("print failed: {e}")))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_analyzer, bench_grouping_pipeline, bench_print_round_trip);
criterion_main!(benches);
