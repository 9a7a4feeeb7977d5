//! Stage graph performance benchmarks
//!
//! Benchmarks precedence-graph construction and cascade execution for
//! growing stage counts; construction is quadratic in the number of stages,
//! so this is the pressure point for large component sets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modkit_benchmarks::criterion_config;
use modkit_core::StageName;
use modkit_stage::{fix_execution_order, StageGraph, StageRequest};

/// One chained stage per component, forced into list order
fn chained_requests(count: usize) -> Vec<StageRequest> {
    let mut requests: Vec<StageRequest> = (0..count)
        .map(|i| StageRequest::new(format!("component-{i}"), StageName::named("init"), || Ok(())))
        .collect();

    fix_execution_order(&mut requests);
    requests
}

/// Every component's finalize waits on every other component's init
fn fan_in_requests(count: usize) -> Vec<StageRequest> {
    let mut requests = Vec::with_capacity(count * 2);

    for i in 0..count {
        let name = format!("component-{i}");
        requests.push(StageRequest::new(name.clone(), StageName::named("init"), || Ok(())));
        requests.push(
            StageRequest::new(name, StageName::named("finalize"), || Ok(()))
                .after_all(StageName::named("init")),
        );
    }

    requests
}

fn bench_graph_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_graph_construction");
    group.sample_size(20);

    for count in [50, 200, 500].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("stages", count), count, |b, &count| {
            b.iter(|| black_box(StageGraph::build(fan_in_requests(count))));
        });
    }

    group.finish();
}

fn bench_cascade_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_cascade_execution");
    group.sample_size(20);

    for count in [50, 200, 500].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("chained", count), count, |b, &count| {
            b.iter(|| {
                let graph = StageGraph::build(chained_requests(count)).unwrap();
                black_box(graph.execute())
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_graph_construction, bench_cascade_execution
}
criterion_main!(benches);
