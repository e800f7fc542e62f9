// Copyright ⓒ 2023 SilverSixpence
// Licensed under the MIT license
// (see LICENSE or <http://opensource.org/licenses/MIT>) All files in the project carrying such
// notice may not be copied, modified, or distributed except according to those terms.

//! # Minimum-crossing linear ordering for NodeTrix-style two-page book embeddings
//!
//! Given a rooted cluster hierarchy (the "inclusion tree") and a set of
//! inter-cluster "bottom" edges, this crate computes a linear order of the
//! hierarchy's leaves such that, when the leaves are placed on a line and the
//! bottom edges are drawn as arcs below it, the number of arc crossings is
//! minimized while the hierarchy itself remains planar when drawn above the
//! line.
//!
//! Three solver families are provided, all implementing the same contract of
//! "graph in, leaf order out":
//! - exact ([solver::exact]): an ILP formulation solved via [good_lp], optimal
//!   but expensive for large instances.
//! - heuristic ([solver::heuristic]): a DFS layout plus iterative
//!   sibling-block refinement, fast and deterministic.
//! - hybrid ([solver::hybrid]): the heuristic's layout with a leaf-restricted
//!   ILP re-optimization pass inside each cluster.
//!
//! ## How this code can be used
//!
//! ```
//! use nodetrix_order::{Graph, Method, Orchestrator, OrchestratorConfig};
//!
//! let json = r#"{
//!     "nodes": [
//!         {"id": "A", "parent": null, "type": "root"},
//!         {"id": "1", "parent": "A", "type": "leaf"},
//!         {"id": "2", "parent": "A", "type": "leaf"},
//!         {"id": "3", "parent": "A", "type": "leaf"},
//!         {"id": "4", "parent": "A", "type": "leaf"}
//!     ],
//!     "edges": [
//!         {"source": "1", "target": "3"},
//!         {"source": "2", "target": "4"}
//!     ]
//! }"#;
//!
//! let graph = Graph::from_json_str(json).unwrap();
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::default());
//! let order = orchestrator.solve("demo", &graph, Method::Heuristic, None).unwrap();
//! assert_eq!(order.leaf_ids().len(), 4);
//! ```

pub mod cli;
pub mod config;
pub mod utils;

mod errors;
pub use errors::SolveError;

mod graph;
pub use graph::{Edge, Graph, GraphLoadError, Node, NodeKind};

mod order;
pub use order::{count_crossings, is_planar, LeafOrder, Order};

pub mod solver;
pub use solver::exact::{ExactConfig, ExactSolver};
pub use solver::heuristic::{HeuristicConfig, HeuristicSolver};
pub use solver::hybrid::{HybridConfig, HybridSolver};

mod orchestrator;
pub use orchestrator::{cache, Method, Orchestrator, OrchestratorConfig};

#[cfg(feature = "fuzzing")]
pub mod fuzz;
