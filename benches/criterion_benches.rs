//! Benchmarks using Criterion.
//!
//! Instance sizes are kept modest here: the exact solver's ILP grows as
//! O(n^3) constraints in the node count, so a handful of leaves is already
//! enough to see its cost relative to the heuristic and hybrid solvers.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use nodetrix_order::{
    count_crossings, ExactConfig, ExactSolver, Graph, HeuristicConfig, HeuristicSolver,
    HybridConfig, HybridSolver, Order,
};

mod synthetic;
use synthetic::random_star_graph;

fn bench_count_crossings(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_crossings");

    for &n in &[16usize, 64, 256] {
        let graph = random_star_graph(n, n, 7);
        let order = Order::new(
            graph
                .nodes()
                .filter(|node| graph.is_leaf(&node.id))
                .map(|node| node.id.clone())
                .collect(),
        );

        group.bench_with_input(BenchmarkId::new("leaves", n), &order, |bench, order| {
            bench.iter(|| count_crossings(order, graph.bottom_edges()));
        });
    }

    group.finish();
}

fn bench_heuristic_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("heuristic_solver");

    for &n in &[16usize, 64, 256, 1024] {
        let graph = random_star_graph(n, n, 7);
        group.bench_with_input(BenchmarkId::new("leaves", n), &graph, |bench, graph| {
            let solver = HeuristicSolver::new(HeuristicConfig::default());
            bench.iter(|| solver.solve(graph).unwrap());
        });
    }

    group.finish();
}

fn bench_hybrid_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_solver");
    group.sample_size(20);

    for &n in &[16usize, 64, 256] {
        let graph = random_star_graph(n, n, 7);
        group.bench_with_input(BenchmarkId::new("leaves", n), &graph, |bench, graph| {
            let solver = HybridSolver::new(HybridConfig::default());
            bench.iter(|| solver.solve(graph).unwrap());
        });
    }

    group.finish();
}

fn bench_exact_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_solver");
    group.sample_size(10);

    // Kept small: the exact solver's constraint count grows as O(n^3).
    for &n in &[6usize, 8, 10] {
        let graph = random_star_graph(n, n, 7);
        group.bench_with_input(BenchmarkId::new("leaves", n), &graph, |bench, graph| {
            let solver = ExactSolver::new(ExactConfig::default());
            bench.iter(|| solver.solve(graph).unwrap());
        });
    }

    group.finish();
}

fn bench_graph_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_from_json");

    for &n in &[64usize, 512, 4096] {
        let graph = random_star_graph(n, n, 7);
        let json = graph_to_json(&graph);
        group.bench_with_input(BenchmarkId::new("leaves", n), &json, |bench, json| {
            bench.iter(|| Graph::from_json_str(json).unwrap());
        });
    }

    group.finish();
}

fn graph_to_json(graph: &Graph) -> String {
    let nodes: Vec<String> = graph
        .nodes()
        .map(|n| {
            let (parent, kind) = match &n.parent {
                Some(p) => (format!("\"{p}\""), "leaf"),
                None => ("null".to_string(), "root"),
            };
            format!("{{\"id\":\"{}\",\"parent\":{parent},\"type\":\"{kind}\"}}", n.id)
        })
        .collect();
    let edges: Vec<String> = graph
        .bottom_edges()
        .iter()
        .map(|e| format!("{{\"source\":\"{}\",\"target\":\"{}\"}}", e.source, e.target))
        .collect();
    format!(
        "{{\"nodes\":[{}],\"edges\":[{}]}}",
        nodes.join(","),
        edges.join(",")
    )
}

criterion_group! {
    name = crossing_benches;
    config = Criterion::default();
    targets = bench_count_crossings, bench_graph_loading, bench_heuristic_solver, bench_hybrid_solver, bench_exact_solver,
}

criterion_main!(crossing_benches);
