//! Synthetic graph generation for benchmarks only: a single root cluster
//! with `leaf_count` leaves and `edge_count` random bottom edges between
//! them, built deterministically from `seed` so benchmark runs are
//! comparable across invocations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nodetrix_order::Graph;

pub fn random_star_graph(leaf_count: usize, edge_count: usize, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut nodes = vec!["{\"id\":\"root\",\"parent\":null,\"type\":\"root\"}".to_string()];
    for i in 0..leaf_count {
        nodes.push(format!(
            "{{\"id\":\"leaf{i}\",\"parent\":\"root\",\"type\":\"leaf\"}}"
        ));
    }

    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        if leaf_count < 2 {
            break;
        }
        let a = rng.gen_range(0..leaf_count);
        let mut b = rng.gen_range(0..leaf_count);
        while b == a {
            b = rng.gen_range(0..leaf_count);
        }
        edges.push(format!("{{\"source\":\"leaf{a}\",\"target\":\"leaf{b}\"}}"));
    }

    let json = format!(
        "{{\"nodes\":[{}],\"edges\":[{}]}}",
        nodes.join(","),
        edges.join(",")
    );
    Graph::from_json_str(&json).expect("synthetic benchmark graph is always well-formed")
}
