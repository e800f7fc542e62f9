//! The exact ILP solver (E): an optimal, binary-program formulation of
//! minimum bottom-edge crossings over a fixed top-page order.
//!
//! This is a direct port of the solver's original Gurobi model (order
//! variables `x[u,v]`, crossing variables `c[e1,e2]`, transitivity and
//! crossing-detection constraints) onto [good_lp] via [super::mip], with the
//! same variable/constraint shapes so the two stay easy to compare.

use std::collections::HashSet;
use std::time::Duration;

use good_lp::Expression;
use itertools::Itertools;
use logging_timer::stimer;
use thiserror::Error;

use crate::graph::{Edge, Graph};
use crate::order::{LeafOrder, Order};
use crate::solver::mip::{add_crossing_constraints, decode_tournament, MipError, MipModel};

#[derive(Error, Debug)]
pub enum ExactSolverError {
    #[error("graph has no nodes to order")]
    Empty,
    #[error(transparent)]
    Mip(#[from] MipError),
    #[error("solved order variables contain a cycle, no valid linear order exists")]
    CyclicSolution,
}

/// Tunables for [ExactSolver]; all have sensible defaults mirroring the
/// original Gurobi parameters (`TimeLimit`, `MIPGap`).
#[derive(Debug, Clone)]
pub struct ExactConfig {
    /// Wall-clock budget for the solve. `None` means no limit.
    pub time_limit: Option<Duration>,
}

impl Default for ExactConfig {
    fn default() -> Self {
        ExactConfig {
            time_limit: Some(Duration::from_secs(3600)),
        }
    }
}

pub struct ExactSolver {
    config: ExactConfig,
}

impl ExactSolver {
    pub fn new(config: ExactConfig) -> Self {
        ExactSolver { config }
    }

    /// Solve for a minimum-crossing order of `graph`'s leaves.
    ///
    /// Builds one ordering variable per ordered pair of nodes (both `u`
    /// before `v` and `v` before `u`), one crossing variable per unordered
    /// pair of same-type edges, fixes the tree's top edges into the order,
    /// forbids crossings among top edges, and minimizes the sum of bottom
    /// edge crossing variables.
    pub fn solve(&self, graph: &Graph) -> Result<LeafOrder, ExactSolverError> {
        let _tmr = stimer!("ExactSolver::solve");

        let nodes: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
        if nodes.is_empty() {
            return Err(ExactSolverError::Empty);
        }

        let top_edges: Vec<Edge> = graph.top_edges();
        let bottom_edges: Vec<Edge> = graph.bottom_edges().to_vec();
        let all_edges: Vec<(Edge, EdgeKind)> = top_edges
            .iter()
            .cloned()
            .map(|e| (e, EdgeKind::Top))
            .chain(bottom_edges.iter().cloned().map(|e| (e, EdgeKind::Bottom)))
            .collect();

        let mut model = MipModel::new();

        let order_key = |u: &str, v: &str| format!("order::{u}::{v}");
        for pair in nodes.iter().combinations(2) {
            let (u, v) = (pair[0], pair[1]);
            model.add_binary(order_key(u, v));
            model.add_binary(order_key(v, u));
        }

        for pair in nodes.iter().combinations(2) {
            let (u, v) = (pair[0], pair[1]);
            let uv = model.var(&order_key(u, v));
            let vu = model.var(&order_key(v, u));
            model.add_constraint((uv + vu).eq(1.0));
        }

        for edge in &top_edges {
            let fixed = model.var(&order_key(&edge.source, &edge.target));
            model.add_constraint(Expression::from(fixed).eq(1.0));
        }

        for triple in nodes.iter().combinations(3) {
            let (a, b, c) = (triple[0], triple[1], triple[2]);
            for (x, y, z) in [
                (a, b, c),
                (a, c, b),
                (b, a, c),
                (b, c, a),
                (c, a, b),
                (c, b, a),
            ] {
                let xy = model.var(&order_key(x, y));
                let yz = model.var(&order_key(y, z));
                let xz = model.var(&order_key(x, z));
                model.add_constraint((xy + yz).leq(xz + 1.0));
            }
        }

        let crossing_key = |e1: &Edge, e2: &Edge| {
            format!(
                "cross::{}::{}::{}::{}",
                e1.source, e1.target, e2.source, e2.target
            )
        };

        let mut objective = Expression::from(0.0);
        for pair in all_edges.iter().combinations(2) {
            let (e1, k1) = pair[0];
            let (e2, k2) = pair[1];
            if k1 != k2 {
                continue;
            }
            let key = crossing_key(e1, e2);
            let c = model.add_binary(key.clone());

            add_crossing_constraints(&mut model, &order_key, c, e1, e2);

            if *k1 == EdgeKind::Top {
                model.add_constraint(Expression::from(c).eq(0.0));
            }
            if *k1 == EdgeKind::Bottom {
                objective = objective + c;
            }
        }

        let solution = model.minimize(objective, self.config.time_limit)?;

        let full_order = decode_tournament(&nodes, &solution, &order_key)
            .ok_or(ExactSolverError::CyclicSolution)?;

        let leaf_ids: HashSet<&str> = graph
            .nodes()
            .filter(|n| graph.is_leaf(&n.id))
            .map(|n| n.id.as_str())
            .collect();

        let leaf_order: Vec<String> = full_order
            .into_iter()
            .filter(|id| leaf_ids.contains(id.as_str()))
            .collect();

        Ok(LeafOrder::new(leaf_order))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Top,
    Bottom,
}
