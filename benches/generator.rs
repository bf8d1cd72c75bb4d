use cflowchart::config::{Config, LayoutConfig};
use cflowchart::dot::write_dot;
use cflowchart::layout::build_flowchart;
use cflowchart::parser::parse_c;
use cflowchart::preprocess::preprocess_source;
use cflowchart::render::render_svg;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn fixture(name: &str) -> &'static str {
    match name {
        "if_decl" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/if_decl.c"
        )),
        "for_loop" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/for_loop.c"
        )),
        "switch_three" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/switch_three.c"
        )),
        "nested_if_else" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/nested_if_else.c"
        )),
        "while_nested" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/while_nested.c"
        )),
        "user_calls" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/user_calls.c"
        )),
        _ => panic!("unknown fixture"),
    }
}

/// Many small functions with a loop, a branch and a switch each.
fn synthetic_source(functions: usize) -> String {
    let mut out = String::new();
    for i in 0..functions {
        out.push_str(&format!(
            "int f{i}(int n) {{\n    int acc = 0, k;\n    for (k = 0; k < n; k++) {{\n        if (k % 2 == 0) {{\n            acc = acc + k;\n        }} else {{\n            acc = acc - 1;\n        }}\n    }}\n    switch (acc) {{\n        case 0: acc = 1; break;\n        case 1: acc = 2; break;\n        default: acc = 3;\n    }}\n    printf(\"%d\", acc);\n    return acc;\n}}\n\n"
        ));
    }
    out
}

const FIXTURES: [&str; 6] = [
    "if_decl",
    "for_loop",
    "switch_three",
    "nested_if_else",
    "while_nested",
    "user_calls",
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for name in FIXTURES {
        let input = preprocess_source(fixture(name));
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let unit = parse_c(black_box(data)).expect("parse failed");
                black_box(unit.functions.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for name in FIXTURES {
        let unit = parse_c(&preprocess_source(fixture(name))).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &unit, |b, unit| {
            b.iter(|| {
                let graph = build_flowchart(black_box(unit), &config);
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");
    let config = Config::default();
    for name in FIXTURES {
        let unit = parse_c(&preprocess_source(fixture(name))).expect("parse failed");
        let graph = build_flowchart(&unit, &config.layout);
        group.bench_with_input(BenchmarkId::new("dot", name), &graph, |b, graph| {
            b.iter(|| black_box(write_dot(black_box(graph), &config).len()));
        });
        group.bench_with_input(BenchmarkId::new("svg", name), &graph, |b, graph| {
            b.iter(|| black_box(render_svg(black_box(graph), &config).len()));
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for functions in [1usize, 10, 50] {
        let source = synthetic_source(functions);
        group.bench_with_input(BenchmarkId::from_parameter(functions), &source, |b, src| {
            b.iter(|| {
                let graph = cflowchart::generate(black_box(src), &config).expect("generate failed");
                black_box(write_dot(&graph, &config).len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_layout, bench_output, bench_end_to_end);
criterion_main!(benches);
