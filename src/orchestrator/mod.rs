//! The orchestrator: the seam between the pure-computation solvers and
//! process-level concerns (filesystem cache, logging, config).
//!
//! It owns no solver state itself; each dispatch constructs a fresh solver
//! invocation over the shared, immutable [Graph].

pub mod cache;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use logging_timer::stimer;

use crate::errors::SolveError;
use crate::graph::Graph;
use crate::order::LeafOrder;
use crate::solver::exact::{ExactConfig, ExactSolver};
use crate::solver::heuristic::{HeuristicConfig, HeuristicSolver};
use crate::solver::hybrid::{HybridConfig, HybridSolver};
use cache::Cache;

/// Which algorithm should produce the order for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Leaves in the order they appear in the input document, no solving.
    Input,
    /// The exact ILP solver (E).
    Ilp,
    /// The heuristic solver (H).
    Heuristic,
    /// The hybrid solver (Y).
    Hybrid,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Input => "input",
            Method::Ilp => "ilp",
            Method::Heuristic => "heuristic",
            Method::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// Tunables for [Orchestrator].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory the on-disk cache lives in.
    pub cache_dir: PathBuf,
    /// Method used when a caller doesn't pick one.
    pub default_method: Method,
    /// Forwarded to [ExactSolver].
    pub exact: ExactConfig,
    /// Forwarded to [HeuristicSolver].
    pub heuristic: HeuristicConfig,
    /// Forwarded to [HybridSolver].
    pub hybrid: HybridConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            cache_dir: PathBuf::from(".nodetrix-order-cache"),
            default_method: Method::Heuristic,
            exact: ExactConfig::default(),
            heuristic: HeuristicConfig::default(),
            hybrid: HybridConfig::default(),
        }
    }
}

/// Dispatches solve requests to the right solver and caches the result.
pub struct Orchestrator {
    config: OrchestratorConfig,
    cache: Cache,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let cache = Cache::new(config.cache_dir.clone());
        Orchestrator { config, cache }
    }

    /// Produce the order for `(instance, method)`, consulting the cache
    /// first and populating it on a successful, non-empty solve.
    ///
    /// `time_limit` overrides the per-method configured limit for this call
    /// only (`Ilp` and `Hybrid`); ignored by `Input` and `Heuristic`.
    pub fn solve(
        &mut self,
        instance: &str,
        graph: &Graph,
        method: Method,
        time_limit: Option<Duration>,
    ) -> Result<LeafOrder, SolveError> {
        let _tmr = stimer!("Orchestrator::solve");

        if let Some(cached) = self.cache.get(instance, method)? {
            debug!("orchestrator: cache hit for instance '{instance}' method '{method}'");
            return Ok(LeafOrder::from_space_separated(&cached));
        }
        debug!("orchestrator: cache miss for instance '{instance}' method '{method}'");

        let order = self.dispatch(graph, method, time_limit)?;

        if order.leaf_ids().is_empty() {
            info!("orchestrator: empty result for instance '{instance}' method '{method}', not caching");
            return Ok(order);
        }

        self.cache.put(instance, method, &order.to_space_separated())?;
        Ok(order)
    }

    fn dispatch(
        &self,
        graph: &Graph,
        method: Method,
        time_limit: Option<Duration>,
    ) -> Result<LeafOrder, SolveError> {
        if graph.len_leaves() == 0 {
            return Err(SolveError::NoLeaves);
        }

        match method {
            Method::Input => Ok(input_order(graph)),
            Method::Ilp => {
                let mut config = self.config.exact.clone();
                if time_limit.is_some() {
                    config.time_limit = time_limit;
                }
                Ok(ExactSolver::new(config).solve(graph)?)
            }
            Method::Heuristic => Ok(HeuristicSolver::new(self.config.heuristic.clone()).solve(graph)?),
            Method::Hybrid => {
                let mut config = self.config.hybrid.clone();
                if time_limit.is_some() {
                    config.per_cluster_time_limit = time_limit;
                }
                Ok(HybridSolver::new(config).solve(graph)?)
            }
        }
    }
}

/// The `input` method: leaves in the order they appear in the source
/// document. [Graph::nodes] is backed by a `HashMap` and has no stable
/// iteration order, so this reads [Graph::node_ids_in_document_order]
/// instead, which the loader populates from the `nodes` array directly.
fn input_order(graph: &Graph) -> LeafOrder {
    let ids: Vec<String> = graph
        .node_ids_in_document_order()
        .iter()
        .filter(|id| graph.is_leaf(id))
        .cloned()
        .collect();
    LeafOrder::new(ids)
}
