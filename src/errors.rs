//! Top-level error and status types returned by the solvers and orchestrator.

use thiserror::Error;

use crate::graph::GraphLoadError;

/// Aggregates every error that can arise while solving a single instance,
/// from graph loading through to a specific solver's internals.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("failed to load graph")]
    GraphLoad(#[from] GraphLoadError),

    #[error("exact solver failed")]
    Exact(#[from] crate::solver::exact::ExactSolverError),

    #[error("heuristic solver failed")]
    Heuristic(#[from] crate::solver::heuristic::HeuristicSolverError),

    #[error("hybrid solver failed")]
    Hybrid(#[from] crate::solver::hybrid::HybridSolverError),

    #[error("orchestrator cache error")]
    Cache(#[from] crate::orchestrator::cache::CacheError),

    #[error("graph has no leaves to order")]
    NoLeaves,
}
