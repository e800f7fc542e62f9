//! The heuristic solver (H): a hierarchy-respecting DFS layout followed by
//! iterative sibling-block refinement.
//!
//! Unlike [super::exact] this never formulates a mathematical program; it
//! builds a planar order directly (pre-order DFS, so I1/I2 hold by
//! construction) and then repeatedly tries small, cheap local moves on each
//! sibling group, keeping only moves that reduce the bottom-edge crossing
//! count without breaking top-page planarity.

use std::collections::HashMap;

use log::{debug, info};
use logging_timer::stimer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::graph::{Edge, Graph};
use crate::order::{count_crossings, is_planar, LeafOrder, Order};

#[derive(Error, Debug)]
pub enum HeuristicSolverError {
    #[error("graph has no nodes to order")]
    Empty,
}

/// Tunables for [HeuristicSolver], matching the defaults named in the design
/// notes on the refinement loop.
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Seed for the random-restart candidate; fixed by default so
    /// out-of-the-box runs are reproducible.
    pub seed: u64,
    /// Bound on the number of global refinement passes over all sibling
    /// groups.
    pub max_passes: usize,
    /// Number of random permutations tried per group, only attempted for
    /// groups with at most [HeuristicConfig::random_restart_max_group_size]
    /// members.
    pub max_random_restarts: usize,
    pub random_restart_max_group_size: usize,
    /// Inclusive window-length range for the local block inversion
    /// candidates (e.g. `2..=4`).
    pub local_inversion_window: (usize, usize),
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            seed: 0,
            max_passes: 3,
            max_random_restarts: 5,
            random_restart_max_group_size: 6,
            local_inversion_window: (2, 4),
        }
    }
}

pub struct HeuristicSolver {
    config: HeuristicConfig,
}

impl HeuristicSolver {
    pub fn new(config: HeuristicConfig) -> Self {
        HeuristicSolver { config }
    }

    /// Solve for a leaf order, discarding the internal full order.
    pub fn solve(&self, graph: &Graph) -> Result<LeafOrder, HeuristicSolverError> {
        let full = self.solve_full(graph)?;
        Ok(leaf_order_of(graph, &full))
    }

    /// Solve and return the full node order (roots, clusters and leaves),
    /// used internally by [super::hybrid::HybridSolver] to seed its
    /// leaf-restricted ILP.
    pub fn solve_full(&self, graph: &Graph) -> Result<Order, HeuristicSolverError> {
        let _tmr = stimer!("HeuristicSolver::solve_full");

        if graph.nodes().next().is_none() {
            return Err(HeuristicSolverError::Empty);
        }

        let subtree_size = compute_subtree_sizes(graph);
        let mut order = initial_layout(graph);
        let top_edges = graph.top_edges();
        let bottom_edges = graph.bottom_edges().to_vec();

        let groups = sibling_groups(graph);
        info!(
            "heuristic: {} nodes, {} sibling groups, {} bottom edges",
            order.len(),
            groups.len(),
            bottom_edges.len()
        );

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        for pass in 0..self.config.max_passes {
            let mut improved_any = false;

            let mut prioritized = groups.clone();
            prioritized.sort_by(|a, b| {
                let score_a = group_priority(graph, &order, &bottom_edges, a);
                let score_b = group_priority(graph, &order, &bottom_edges, b);
                score_b.cmp(&score_a)
            });

            for (parent, children) in &prioritized {
                loop {
                    let improved = refine_group(
                        graph,
                        &mut order,
                        &top_edges,
                        &bottom_edges,
                        &subtree_size,
                        parent,
                        children,
                        &self.config,
                        &mut rng,
                    );
                    if !improved {
                        break;
                    }
                    improved_any = true;
                }
            }

            debug!("heuristic: pass {pass} improved_any={improved_any}");
            if !improved_any {
                break;
            }
        }

        Ok(order)
    }
}

fn leaf_order_of(graph: &Graph, full: &Order) -> LeafOrder {
    let ids: Vec<String> = full
        .ids()
        .iter()
        .filter(|id| graph.is_leaf(id))
        .cloned()
        .collect();
    LeafOrder::new(ids)
}

/// Pre-order DFS from each root, children visited id-sorted. Appends any
/// node not reached by the traversal (shouldn't occur given [Graph]'s
/// single-root, acyclic invariants, but kept for defensiveness) in id-sorted
/// order at the end.
fn initial_layout(graph: &Graph) -> Order {
    let mut sequence = Vec::new();
    let mut visited = std::collections::HashSet::new();

    let mut roots: Vec<String> = graph.roots().to_vec();
    roots.sort();

    for root in roots {
        dfs_visit(graph, &root, &mut sequence, &mut visited);
    }

    let mut remaining: Vec<String> = graph
        .nodes()
        .map(|n| n.id.clone())
        .filter(|id| !visited.contains(id))
        .collect();
    remaining.sort();
    for id in remaining {
        visited.insert(id.clone());
        sequence.push(id);
    }

    Order::new(sequence)
}

fn dfs_visit(
    graph: &Graph,
    id: &str,
    sequence: &mut Vec<String>,
    visited: &mut std::collections::HashSet<String>,
) {
    if !visited.insert(id.to_string()) {
        return;
    }
    sequence.push(id.to_string());
    let mut children = graph.children(id).to_vec();
    children.sort();
    for child in children {
        dfs_visit(graph, &child, sequence, visited);
    }
}

fn compute_subtree_sizes(graph: &Graph) -> HashMap<String, usize> {
    let mut sizes = HashMap::new();
    for root in graph.roots() {
        compute_subtree_size(graph, root, &mut sizes);
    }
    sizes
}

fn compute_subtree_size(graph: &Graph, id: &str, sizes: &mut HashMap<String, usize>) -> usize {
    if let Some(&size) = sizes.get(id) {
        return size;
    }
    let mut size = 1;
    for child in graph.children(id) {
        size += compute_subtree_size(graph, child, sizes);
    }
    sizes.insert(id.to_string(), size);
    size
}

/// Every internal node with at least two children, paired with its children
/// in document order.
fn sibling_groups(graph: &Graph) -> Vec<(String, Vec<String>)> {
    let mut groups = Vec::new();
    for node in graph.nodes() {
        let children = graph.children(&node.id);
        if children.len() >= 2 {
            groups.push((node.id.clone(), children.to_vec()));
        }
    }
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
}

/// How many bottom-edge crossings involve a leaf descendant of some member
/// of `children`, under `order`. Used only to prioritize which group to
/// refine next.
fn group_priority(graph: &Graph, order: &Order, bottom_edges: &[Edge], children: &[String]) -> usize {
    let leaf_set: std::collections::HashSet<String> = children
        .iter()
        .flat_map(|c| graph.leaf_descendants(c))
        .collect();

    let touches = |e: &Edge| leaf_set.contains(&e.source) || leaf_set.contains(&e.target);

    let mut score = 0;
    for i in 0..bottom_edges.len() {
        for j in (i + 1)..bottom_edges.len() {
            if !touches(&bottom_edges[i]) && !touches(&bottom_edges[j]) {
                continue;
            }
            if edges_cross(order, &bottom_edges[i], &bottom_edges[j]) {
                score += 1;
            }
        }
    }
    score
}

fn edges_cross(order: &Order, e1: &Edge, e2: &Edge) -> bool {
    let (Some(a), Some(b)) = (order.position_of(&e1.source), order.position_of(&e1.target)) else {
        return false;
    };
    let (Some(c), Some(d)) = (order.position_of(&e2.source), order.position_of(&e2.target)) else {
        return false;
    };
    let (a, b) = if a < b { (a, b) } else { (b, a) };
    let (c, d) = if c < d { (c, d) } else { (d, c) };
    (a < c && c < b && b < d) || (c < a && a < d && d < b)
}

/// Try every candidate reordering of `children` (a sibling group of
/// `parent`), accept the strictly-best planarity-preserving one, and apply
/// it in place to `order`. Returns whether a move was accepted.
#[allow(clippy::too_many_arguments)]
fn refine_group(
    graph: &Graph,
    order: &mut Order,
    top_edges: &[Edge],
    bottom_edges: &[Edge],
    subtree_size: &HashMap<String, usize>,
    parent: &str,
    children: &[String],
    config: &HeuristicConfig,
    rng: &mut StdRng,
) -> bool {
    let lo = children
        .iter()
        .map(|c| order.position_of(c).expect("child must be present in order"))
        .min()
        .unwrap();
    let hi = children
        .iter()
        .map(|c| {
            let start = order.position_of(c).unwrap();
            start + subtree_size[c] - 1
        })
        .max()
        .unwrap();

    let current_score = leaf_crossings(graph, order, bottom_edges);

    let candidates = candidate_child_orders(graph, order, children, config, rng);

    let mut best: Option<(usize, Vec<String>)> = None;
    for candidate_children in candidates {
        let block = rebuild_block(order, subtree_size, &candidate_children);
        let mut trial = order.clone();
        trial.set_range(lo, &block);

        if !is_planar(&trial, top_edges) {
            continue;
        }

        let score = leaf_crossings(graph, &trial, bottom_edges);
        if score < current_score {
            match &best {
                Some((best_score, _)) if *best_score <= score => {}
                _ => best = Some((score, block)),
            }
        }
    }

    // Raw-sequence candidates that don't preserve the child-block structure
    // (whole-block reversal, leaf-only reversal) are generated and
    // planarity-checked separately since they aren't expressed as a
    // permutation of `children`.
    for raw in raw_candidates(graph, order, lo, hi) {
        let mut trial = order.clone();
        trial.set_range(lo, &raw);
        if !is_planar(&trial, top_edges) {
            continue;
        }
        let score = leaf_crossings(graph, &trial, bottom_edges);
        if score < current_score {
            match &best {
                Some((best_score, _)) if *best_score <= score => {}
                _ => best = Some((score, raw)),
            }
        }
    }

    match best {
        Some((score, block)) => {
            debug!(
                "heuristic: group under '{parent}' improved {current_score} -> {score}"
            );
            order.set_range(lo, &block);
            true
        }
        None => false,
    }
}

fn leaf_crossings(graph: &Graph, order: &Order, bottom_edges: &[Edge]) -> usize {
    let leaf_order = order.retain_only(|id| graph.is_leaf(id));
    count_crossings(&leaf_order, bottom_edges)
}

/// Every candidate permutation of the sibling group itself (barycenter,
/// connectivity, full reversal, local inversions, random restarts).
fn candidate_child_orders(
    graph: &Graph,
    order: &Order,
    children: &[String],
    config: &HeuristicConfig,
    rng: &mut StdRng,
) -> Vec<Vec<String>> {
    let mut candidates = Vec::new();

    candidates.push(barycenter_order(graph, order, children));
    candidates.push(connectivity_order(graph, order, children));

    let mut reversed = children.to_vec();
    reversed.reverse();
    candidates.push(reversed);

    let (min_w, max_w) = config.local_inversion_window;
    for window in min_w..=max_w.min(children.len()) {
        for start in 0..=children.len().saturating_sub(window) {
            if window == 0 {
                continue;
            }
            let mut candidate = children.to_vec();
            candidate[start..start + window].reverse();
            candidates.push(candidate);
        }
    }

    if children.len() <= config.random_restart_max_group_size {
        for _ in 0..config.max_random_restarts {
            let mut candidate = children.to_vec();
            candidate.shuffle(rng);
            candidates.push(candidate);
        }
    }

    candidates
}

/// Sort `children` by the mean current position of bottom-edge neighbors of
/// each member's leaf descendants; members with no neighbor keep their
/// current position as the sort key.
fn barycenter_order(graph: &Graph, order: &Order, children: &[String]) -> Vec<String> {
    let mut keyed: Vec<(f64, String)> = children
        .iter()
        .map(|c| {
            let key = barycenter_of(graph, order, c)
                .unwrap_or_else(|| order.position_of(c).unwrap() as f64);
            (key, c.clone())
        })
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    keyed.into_iter().map(|(_, id)| id).collect()
}

fn barycenter_of(graph: &Graph, order: &Order, member: &str) -> Option<f64> {
    let leaves = graph.leaf_descendants(member);
    let leaf_set: std::collections::HashSet<&str> = leaves.iter().map(String::as_str).collect();

    let mut positions = Vec::new();
    for edge in graph.bottom_edges() {
        let other = if leaf_set.contains(edge.source.as_str()) {
            Some(edge.target.as_str())
        } else if leaf_set.contains(edge.target.as_str()) {
            Some(edge.source.as_str())
        } else {
            None
        };
        if let Some(other) = other {
            if let Some(pos) = order.position_of(other) {
                positions.push(pos as f64);
            }
        }
    }

    if positions.is_empty() {
        None
    } else {
        Some(positions.iter().sum::<f64>() / positions.len() as f64)
    }
}

/// Sort `children` by descending bottom-degree (number of bottom edges
/// touching any leaf descendant of the member).
fn connectivity_order(graph: &Graph, _order: &Order, children: &[String]) -> Vec<String> {
    let mut keyed: Vec<(usize, String)> = children
        .iter()
        .map(|c| (bottom_degree(graph, c), c.clone()))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, id)| id).collect()
}

fn bottom_degree(graph: &Graph, member: &str) -> usize {
    let leaves = graph.leaf_descendants(member);
    let leaf_set: std::collections::HashSet<&str> = leaves.iter().map(String::as_str).collect();
    graph
        .bottom_edges()
        .iter()
        .filter(|e| leaf_set.contains(e.source.as_str()) || leaf_set.contains(e.target.as_str()))
        .count()
}

/// Concatenate each child's current subtree block, in `child_order`, to
/// produce the raw id sequence for the group's span.
fn rebuild_block(
    order: &Order,
    subtree_size: &HashMap<String, usize>,
    child_order: &[String],
) -> Vec<String> {
    let mut block = Vec::new();
    for child in child_order {
        let start = order.position_of(child).unwrap();
        let size = subtree_size[child];
        block.extend(order.ids()[start..start + size].iter().cloned());
    }
    block
}

/// Candidates expressed as a direct transform of the raw id sequence
/// `order.ids()[lo..=hi]`, rather than a permutation of the sibling group:
/// reversing the whole block, and reversing only the leaf positions within
/// it while holding internal (cluster) nodes fixed. Both can break I1/I2
/// for nested clusters, which is why every caller planarity-checks the
/// result before accepting it.
fn raw_candidates(graph: &Graph, order: &Order, lo: usize, hi: usize) -> Vec<Vec<String>> {
    let slice = &order.ids()[lo..=hi];

    let mut whole_reversed = slice.to_vec();
    whole_reversed.reverse();

    let mut leaves: Vec<String> = slice.iter().filter(|id| graph.is_leaf(id)).cloned().collect();
    leaves.reverse();
    let mut leaf_iter = leaves.into_iter();
    let leaves_reversed: Vec<String> = slice
        .iter()
        .map(|id| {
            if graph.is_leaf(id) {
                leaf_iter.next().unwrap()
            } else {
                id.clone()
            }
        })
        .collect();

    vec![whole_reversed, leaves_reversed]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn graph(nodes: Vec<(&str, Option<&str>, &str)>, edges: Vec<(&str, &str)>) -> Graph {
        let nodes_json: Vec<String> = nodes
            .into_iter()
            .map(|(id, parent, kind)| {
                let parent = match parent {
                    Some(p) => format!("\"{p}\""),
                    None => "null".to_string(),
                };
                format!("{{\"id\":\"{id}\",\"parent\":{parent},\"type\":\"{kind}\"}}")
            })
            .collect();
        let edges_json: Vec<String> = edges
            .into_iter()
            .map(|(s, t)| format!("{{\"source\":\"{s}\",\"target\":\"{t}\"}}"))
            .collect();
        let json = format!(
            "{{\"nodes\":[{}],\"edges\":[{}]}}",
            nodes_json.join(","),
            edges_json.join(",")
        );
        Graph::from_json_str(&json).unwrap()
    }

    #[test]
    fn produces_planar_order_with_all_leaves() {
        let g = graph(
            vec![
                ("A", None, "root"),
                ("1", Some("A"), "leaf"),
                ("2", Some("A"), "leaf"),
                ("3", Some("A"), "leaf"),
                ("4", Some("A"), "leaf"),
            ],
            vec![("1", "3"), ("2", "4")],
        );
        let solver = HeuristicSolver::new(HeuristicConfig::default());
        let full = solver.solve_full(&g).unwrap();
        assert!(is_planar(&full, &g.top_edges()));

        let leaf_order = solver.solve(&g).unwrap();
        let mut sorted = leaf_order.leaf_ids().to_vec();
        sorted.sort();
        assert_eq!(sorted, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn reduces_crossings_from_initial_layout() {
        let g = graph(
            vec![
                ("A", None, "root"),
                ("1", Some("A"), "leaf"),
                ("2", Some("A"), "leaf"),
                ("3", Some("A"), "leaf"),
                ("4", Some("A"), "leaf"),
            ],
            vec![("1", "3"), ("2", "4")],
        );
        let solver = HeuristicSolver::new(HeuristicConfig::default());
        let leaf_order = solver.solve(&g).unwrap();
        let order = Order::new(leaf_order.leaf_ids().to_vec());
        assert_eq!(count_crossings(&order, g.bottom_edges()), 0);
    }

    #[test]
    fn respects_cluster_contiguity() {
        let g = graph(
            vec![
                ("A", None, "root"),
                ("B", Some("A"), "cluster"),
                ("C", Some("A"), "cluster"),
                ("1", Some("B"), "leaf"),
                ("2", Some("B"), "leaf"),
                ("3", Some("C"), "leaf"),
                ("4", Some("C"), "leaf"),
            ],
            vec![("1", "4"), ("2", "3")],
        );
        let solver = HeuristicSolver::new(HeuristicConfig::default());
        let full = solver.solve_full(&g).unwrap();
        assert!(is_planar(&full, &g.top_edges()));

        let b_leaves: Vec<usize> = ["1", "2"]
            .iter()
            .map(|id| full.position_of(id).unwrap())
            .collect();
        let c_leaves: Vec<usize> = ["3", "4"]
            .iter()
            .map(|id| full.position_of(id).unwrap())
            .collect();
        assert_eq!((b_leaves[1] as i64 - b_leaves[0] as i64).abs(), 1);
        assert_eq!((c_leaves[1] as i64 - c_leaves[0] as i64).abs(), 1);
    }

    #[test]
    fn deterministic_given_fixed_seed() {
        let g = graph(
            vec![
                ("A", None, "root"),
                ("1", Some("A"), "leaf"),
                ("2", Some("A"), "leaf"),
                ("3", Some("A"), "leaf"),
                ("4", Some("A"), "leaf"),
                ("5", Some("A"), "leaf"),
                ("6", Some("A"), "leaf"),
            ],
            vec![("1", "4"), ("2", "5"), ("3", "6"), ("1", "6")],
        );
        let a = HeuristicSolver::new(HeuristicConfig::default()).solve(&g).unwrap();
        let b = HeuristicSolver::new(HeuristicConfig::default()).solve(&g).unwrap();
        assert_eq!(a, b);
    }
}
