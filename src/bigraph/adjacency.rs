//! Adjacency document: the JSON snapshot exchanged between the graph
//! builder and the behavior reasoner.
//!
//! Layout (the usual node-link adjacency form):
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": false,
//!   "graph": {},
//!   "nodes": [{"id": {...}, "predicates": {...}}],
//!   "adjacency": [[{"id": {...}, "transition": "speed.value > 3"}]]
//! }
//! ```
//!
//! `adjacency[i]` lists the out-edges of `nodes[i]`.

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, PredicateSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyDoc {
    #[serde(default = "directed_by_default")]
    pub directed: bool,
    #[serde(default)]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<AdjacencyNode>,
    #[serde(default)]
    pub adjacency: Vec<Vec<AdjacencyEdge>>,
}

fn directed_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyNode {
    pub id: NodeId,
    #[serde(default)]
    pub predicates: PredicateSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyEdge {
    /// Target node.
    pub id: NodeId,
    /// Predicate text gating the edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
}

impl AdjacencyDoc {
    pub fn new() -> Self {
        Self {
            directed: true,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    /// Append a node with an empty out-edge list; returns its position.
    pub fn push_node(&mut self, id: NodeId, predicates: PredicateSet) -> usize {
        self.nodes.push(AdjacencyNode { id, predicates });
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn push_edge(&mut self, from: usize, to: NodeId, transition: Option<String>) {
        if let Some(edges) = self.adjacency.get_mut(from) {
            edges.push(AdjacencyEdge { id: to, transition });
        }
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }
}

impl Default for AdjacencyDoc {
    fn default() -> Self {
        Self::new()
    }
}
