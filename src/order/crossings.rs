//! The crossing-count metric every solver optimizes against.

use super::Order;
use crate::graph::Edge;

/// Count the number of unordered edge pairs whose endpoints interleave in
/// `order`, i.e. draw as crossing arcs when `order` is laid out on a line.
///
/// Edges with an endpoint missing from `order` are skipped (this lets
/// callers pass the full node order together with `top_edges()`, or a
/// leaf-only order together with `bottom_edges()`, without pre-filtering).
///
/// `O(|edges|²)`; fine for the instance sizes this crate targets, and it is
/// the same complexity the exact solver's crossing-variable count already
/// imposes on the ILP.
pub fn count_crossings(order: &Order, edges: &[Edge]) -> usize {
    let spans: Vec<Option<(usize, usize)>> = edges
        .iter()
        .map(|e| {
            let a = order.position_of(&e.source)?;
            let b = order.position_of(&e.target)?;
            Some(if a < b { (a, b) } else { (b, a) })
        })
        .collect();

    let mut crossings = 0;
    for i in 0..spans.len() {
        let Some((a, b)) = spans[i] else { continue };
        for span in spans.iter().skip(i + 1) {
            let Some((c, d)) = *span else { continue };
            if interleaves(a, b, c, d) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Two edges with sorted endpoints `(a,b)` and `(c,d)` cross iff exactly one
/// of `c,d` lies strictly between `a` and `b` (and the edges don't share an
/// endpoint, which this condition already rules out).
fn interleaves(a: usize, b: usize, c: usize, d: usize) -> bool {
    (a < c && c < b && b < d) || (c < a && a < d && d < b)
}

/// A linear order is planar with respect to `edges` iff it induces zero
/// crossings among them — used to check top-page planarity of a full node
/// order against its hierarchy's top edges.
pub fn is_planar(order: &Order, edges: &[Edge]) -> bool {
    count_crossings(order, edges) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(s: &str, t: &str) -> Edge {
        Edge {
            source: s.to_string(),
            target: t.to_string(),
        }
    }

    #[test]
    fn no_crossings_for_disjoint_edges() {
        let order = Order::new(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        let edges = vec![edge("1", "2"), edge("3", "4")];
        assert_eq!(count_crossings(&order, &edges), 0);
        assert!(is_planar(&order, &edges));
    }

    #[test]
    fn no_crossings_for_nested_edges() {
        let order = Order::new(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        let edges = vec![edge("1", "4"), edge("2", "3")];
        assert_eq!(count_crossings(&order, &edges), 0);
    }

    #[test]
    fn counts_one_crossing_for_interleaved_edges() {
        let order = Order::new(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        let edges = vec![edge("1", "3"), edge("2", "4")];
        assert_eq!(count_crossings(&order, &edges), 1);
        assert!(!is_planar(&order, &edges));
    }

    #[test]
    fn counts_multiple_pairwise_crossings() {
        let order = Order::new(vec!["1".into(), "2".into(), "3".into(), "4".into(), "5".into(), "6".into()]);
        let edges = vec![edge("1", "4"), edge("2", "5"), edge("3", "6")];
        assert_eq!(count_crossings(&order, &edges), 3);
    }

    #[test]
    fn skips_edges_with_unknown_endpoints() {
        let order = Order::new(vec!["1".into(), "2".into()]);
        let edges = vec![edge("1", "ghost")];
        assert_eq!(count_crossings(&order, &edges), 0);
    }
}
