//! JSON deserialization and structural validation for [super::Graph].
//!
//! The wire format is the same `{"nodes": [...], "edges": [...]}` document
//! the original graph editor produced: each node carries an `id`, an
//! optional `parent`, and a `type` of `"root"`, `"cluster"` or `"leaf"`; each
//! edge carries a `source` and `target` leaf id.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use super::{Edge, Graph, Node, NodeKind};

/// Raw, unvalidated node as it appears in the JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Raw, unvalidated edge as it appears in the JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDocument {
    pub source: String,
    pub target: String,
}

/// The top-level JSON shape accepted by [Graph::from_document].
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    pub edges: Vec<EdgeDocument>,
}

/// Everything that can go wrong turning a [GraphDocument] into a [Graph].
#[derive(Error, Debug)]
pub enum GraphLoadError {
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),

    #[error("node '{0}' has an unknown type {1:?}, expected one of root/cluster/leaf")]
    UnknownNodeType(String, String),

    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("parent '{parent}' of node '{node}' was not found")]
    DanglingParent { node: String, parent: String },

    #[error("cycle detected in parent hierarchy starting at '{0}'")]
    ParentCycle(String),

    #[error("cluster '{0}' has no children")]
    EmptyCluster(String),

    #[error("edge ({source:?}, {target:?}) references an unknown node")]
    UnknownEdgeEndpoint { source: String, target: String },

    #[error("more than one node has no parent; exactly one root is required (found {0:?})")]
    MultipleRoots(Vec<String>),

    #[error("graph has no nodes")]
    Empty,
}

/// Validate a [GraphDocument] the way the original graph editor's upload
/// handler did, then build the indexed [Graph].
pub(super) fn validate_and_build(doc: GraphDocument) -> Result<Graph, GraphLoadError> {
    if doc.nodes.is_empty() {
        return Err(GraphLoadError::Empty);
    }

    let mut node_ids = HashSet::with_capacity(doc.nodes.len());
    for n in &doc.nodes {
        if !node_ids.insert(n.id.clone()) {
            return Err(GraphLoadError::DuplicateNodeId(n.id.clone()));
        }
    }

    for n in &doc.nodes {
        if let Some(parent) = &n.parent {
            if !node_ids.contains(parent) {
                return Err(GraphLoadError::DanglingParent {
                    node: n.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let parent_of: HashMap<&str, Option<&str>> = doc
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.parent.as_deref()))
        .collect();

    for n in &doc.nodes {
        let mut visited = HashSet::new();
        visited.insert(n.id.as_str());
        let mut cur = n.id.as_str();
        loop {
            match parent_of.get(cur).copied().flatten() {
                None => break,
                Some(parent) => {
                    if !visited.insert(parent) {
                        return Err(GraphLoadError::ParentCycle(n.id.clone()));
                    }
                    cur = parent;
                }
            }
        }
    }

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut roots = Vec::new();
    for n in &doc.nodes {
        match &n.parent {
            Some(parent) => children.entry(parent.clone()).or_default().push(n.id.clone()),
            None => roots.push(n.id.clone()),
        }
    }

    if roots.len() > 1 {
        return Err(GraphLoadError::MultipleRoots(roots));
    }

    let node_order: Vec<String> = doc.nodes.iter().map(|n| n.id.clone()).collect();

    let mut nodes = HashMap::with_capacity(doc.nodes.len());
    for n in &doc.nodes {
        let kind = match n.kind.as_str() {
            "root" => NodeKind::Root,
            "cluster" => NodeKind::Cluster,
            "leaf" => NodeKind::Leaf,
            other => {
                return Err(GraphLoadError::UnknownNodeType(n.id.clone(), other.to_string()))
            }
        };
        if kind == NodeKind::Cluster
            && children.get(&n.id).map(Vec::is_empty).unwrap_or(true)
        {
            return Err(GraphLoadError::EmptyCluster(n.id.clone()));
        }
        nodes.insert(
            n.id.clone(),
            Node {
                id: n.id.clone(),
                parent: n.parent.clone(),
                kind,
            },
        );
    }

    let mut edges = Vec::with_capacity(doc.edges.len());
    for e in &doc.edges {
        if !node_ids.contains(&e.source) || !node_ids.contains(&e.target) {
            return Err(GraphLoadError::UnknownEdgeEndpoint {
                source: e.source.clone(),
                target: e.target.clone(),
            });
        }
        edges.push(Edge {
            source: e.source.clone(),
            target: e.target.clone(),
        });
    }

    Ok(Graph {
        nodes,
        node_order,
        children,
        edges,
        roots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn node(id: &str, parent: Option<&str>, kind: &str) -> NodeDocument {
        NodeDocument {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            kind: kind.to_string(),
        }
    }

    fn edge(source: &str, target: &str) -> EdgeDocument {
        EdgeDocument {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn rejects_dangling_parent() {
        let doc = GraphDocument {
            nodes: vec![node("A", Some("ghost"), "leaf")],
            edges: vec![],
        };
        assert!(matches!(
            Graph::from_document(doc),
            Err(GraphLoadError::DanglingParent { .. })
        ));
    }

    #[test]
    fn rejects_cycle() {
        let doc = GraphDocument {
            nodes: vec![
                node("A", Some("B"), "cluster"),
                node("B", Some("A"), "cluster"),
            ],
            edges: vec![],
        };
        assert!(matches!(
            Graph::from_document(doc),
            Err(GraphLoadError::ParentCycle(_))
        ));
    }

    #[test]
    fn rejects_empty_cluster() {
        let doc = GraphDocument {
            nodes: vec![node("A", None, "cluster")],
            edges: vec![],
        };
        assert!(matches!(
            Graph::from_document(doc),
            Err(GraphLoadError::EmptyCluster(_))
        ));
    }

    #[test]
    fn rejects_unknown_edge_endpoint() {
        let doc = GraphDocument {
            nodes: vec![
                node("A", None, "root"),
                node("1", Some("A"), "leaf"),
            ],
            edges: vec![edge("1", "ghost")],
        };
        assert!(matches!(
            Graph::from_document(doc),
            Err(GraphLoadError::UnknownEdgeEndpoint { .. })
        ));
    }

    #[test]
    fn accepts_minimal_valid_graph() {
        let doc = GraphDocument {
            nodes: vec![
                node("A", None, "root"),
                node("1", Some("A"), "leaf"),
                node("2", Some("A"), "leaf"),
            ],
            edges: vec![edge("1", "2")],
        };
        let graph = Graph::from_document(doc).unwrap();
        assert_eq!(graph.len_leaves(), 2);
        assert_eq!(graph.roots(), &["A".to_string()]);
    }
}
