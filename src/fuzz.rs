//! Fuzz entry points, gated behind the `fuzzing` feature and driven by the
//! `nodetrix-order-fuzz` crate under `fuzz/`.
//!
//! Mirrors the teacher's pattern of a thin `pub fn fuzz_*` per target living
//! in the library crate itself (so the target binary stays a one-line
//! `fuzz_target!` call), rather than putting fuzzing logic in `fuzz/`.

use arbitrary::{Arbitrary, Unstructured};

use crate::graph::Graph;
use crate::order::{count_crossings, Order};
use crate::solver::heuristic::{HeuristicConfig, HeuristicSolver};

/// Feed arbitrary bytes straight to [Graph::from_json_str]. The parser must
/// never panic, only return `Err`, no matter how malformed the input is.
pub fn fuzz_graph_from_json(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Graph::from_json_str(text);
    }
}

/// A small, structurally-valid-by-construction hierarchy: one root, a flat
/// list of leaves under it, and a set of bottom edges among them. Bounded to
/// keep fuzz iterations fast.
#[derive(Debug)]
pub struct FuzzHierarchy {
    leaf_count: u8,
    edges: Vec<(u8, u8)>,
}

impl<'a> Arbitrary<'a> for FuzzHierarchy {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let leaf_count: u8 = u.int_in_range(1..=32)?;
        let edge_count: u8 = u.int_in_range(0..=32)?;
        let mut edges = Vec::with_capacity(edge_count as usize);
        for _ in 0..edge_count {
            let a: u8 = u.int_in_range(0..=leaf_count.saturating_sub(1))?;
            let b: u8 = u.int_in_range(0..=leaf_count.saturating_sub(1))?;
            if a != b {
                edges.push((a, b));
            }
        }
        Ok(FuzzHierarchy { leaf_count, edges })
    }
}

impl FuzzHierarchy {
    fn to_graph(&self) -> Graph {
        let mut nodes = vec!["{\"id\":\"root\",\"parent\":null,\"type\":\"root\"}".to_string()];
        for i in 0..self.leaf_count {
            nodes.push(format!(
                "{{\"id\":\"leaf{i}\",\"parent\":\"root\",\"type\":\"leaf\"}}"
            ));
        }
        let edges: Vec<String> = self
            .edges
            .iter()
            .map(|(a, b)| format!("{{\"source\":\"leaf{a}\",\"target\":\"leaf{b}\"}}"))
            .collect();
        let json = format!(
            "{{\"nodes\":[{}],\"edges\":[{}]}}",
            nodes.join(","),
            edges.join(",")
        );
        Graph::from_json_str(&json).expect("generated hierarchy is always well-formed")
    }
}

/// Exercise the heuristic solver against a randomly generated (but always
/// structurally valid) hierarchy, checking that whatever it returns is a
/// permutation of the graph's leaves and never increases crossings relative
/// to the identity order.
pub fn fuzz_heuristic_solver(hierarchy: FuzzHierarchy) {
    let graph = hierarchy.to_graph();
    let Ok(result) = HeuristicSolver::new(HeuristicConfig::default()).solve(&graph) else {
        return;
    };

    let mut got: Vec<&String> = result.leaf_ids().iter().collect();
    got.sort();
    let mut want: Vec<&String> = graph
        .nodes()
        .filter(|n| graph.is_leaf(&n.id))
        .map(|n| &n.id)
        .collect();
    want.sort();
    assert_eq!(got, want, "heuristic solver dropped or duplicated a leaf");

    let identity = Order::new(want.into_iter().cloned().collect());
    let solved = Order::new(result.leaf_ids().to_vec());
    assert!(
        count_crossings(&solved, graph.bottom_edges())
            <= count_crossings(&identity, graph.bottom_edges())
    );
}
