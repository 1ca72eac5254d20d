//! Routing benchmarks.
//!
//! Run with: `cargo bench -p chatterbox-router`

use chatterbox_router::{MethodTable, Router};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;

fn split(path: &str) -> Vec<String> {
    path.split('/').skip(1).map(String::from).collect()
}

fn build_router(num_endpoints: usize) -> Router<String> {
    let mut router = Router::new();

    for i in 0..num_endpoints / 3 {
        router
            .insert(
                &format!("/api/v1/resource{i}"),
                MethodTable::new().get(format!("getResource{i}")),
            )
            .unwrap();
    }

    for i in 0..num_endpoints / 3 {
        router
            .insert(
                &format!("/api/v1/resource{i}/{{id}}"),
                MethodTable::new().get(format!("getResourceById{i}")),
            )
            .unwrap();
    }

    for i in 0..num_endpoints / 3 {
        router
            .insert(
                &format!("/api/v1/communities/{{community}}/channels/{{channel}}/resource{i}"),
                MethodTable::new()
                    .get(format!("listResource{i}"))
                    .post(format!("createResource{i}")),
            )
            .unwrap();
    }

    router
}

fn bench_literal_match(c: &mut Criterion) {
    let router = build_router(30);
    let path = split("/api/v1/resource5");

    c.bench_function("literal_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, &path)));
    });
}

fn bench_capture_match(c: &mut Criterion) {
    let router = build_router(30);
    let path = split("/api/v1/communities/_/channels/general/resource9");

    c.bench_function("capture_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::POST, &path)));
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(30);
    let path = split("/api/v1/nonexistent/path/here");

    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, &path)));
    });
}

fn bench_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");
    for size in [9, 30, 90] {
        let router = build_router(size);
        let last = size / 3 - 1;
        let path = split(&format!(
            "/api/v1/communities/_/channels/_/resource{last}"
        ));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(router.match_route(&Method::GET, &path)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_literal_match,
    bench_capture_match,
    bench_miss,
    bench_table_size
);
criterion_main!(benches);
