//! # Behavior Interval Graph
//!
//! Directed graph over node identities, built from an adjacency document
//! rather than from geometry. Nodes carry a predicate set; edges carry a
//! [`TransitionStatement`]. The graph is immutable once built and all
//! queries are pure reads.

pub mod adjacency;
pub mod propagation;

use std::fmt;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, info};

use crate::config::PropagationConfig;
use crate::context::Context;
use crate::model::{NodeId, PredicateSet};
use crate::transition::TransitionStatement;
use crate::{Error, Result};
use adjacency::AdjacencyDoc;
pub use propagation::Route;
use propagation::Topology;

#[derive(Debug, Clone)]
pub struct BehaviorIGraph {
    ids: Vec<NodeId>,
    predicates: Vec<PredicateSet>,
    index: HashMap<NodeId, usize>,
    /// Out-neighbours by node position.
    out: Vec<Vec<usize>>,
    transitions: HashMap<(usize, usize), TransitionStatement>,
    propagation: PropagationConfig,
}

impl BehaviorIGraph {
    /// Build from an adjacency document. Edge targets missing from the node
    /// list are added with an empty predicate set; a repeated node merges
    /// into the first occurrence.
    pub fn from_adjacency(ctx: &Context, doc: AdjacencyDoc, propagation: PropagationConfig) -> Result<Self> {
        let _guard = ctx.span().enter();
        let mut graph = Self {
            ids: Vec::with_capacity(doc.nodes.len()),
            predicates: Vec::with_capacity(doc.nodes.len()),
            index: HashMap::with_capacity(doc.nodes.len()),
            out: Vec::with_capacity(doc.nodes.len()),
            transitions: HashMap::new(),
            propagation,
        };

        let positions: Vec<usize> = doc
            .nodes
            .into_iter()
            .map(|node| graph.intern(node.id, Some(node.predicates)))
            .collect();

        if doc.adjacency.len() > positions.len() {
            return Err(Error::Precondition(format!(
                "Adjacency lists {} edge sets for {} nodes",
                doc.adjacency.len(),
                positions.len()
            )));
        }

        for (u, edges) in positions.into_iter().zip(doc.adjacency) {
            for edge in edges {
                let v = graph.intern(edge.id, None);
                if !graph.out[u].contains(&v) {
                    graph.out[u].push(v);
                }
                if let Some(text) = edge.transition {
                    graph.transitions.insert((u, v), TransitionStatement::parse(&text)?);
                }
            }
        }

        info!(nodes = graph.node_count(), edges = graph.edge_count(), "Behavior graph constructed");
        Ok(graph)
    }

    /// Build from the JSON text of an adjacency document.
    pub fn from_json(ctx: &Context, json: &str, propagation: PropagationConfig) -> Result<Self> {
        let doc: AdjacencyDoc = serde_json::from_str(json)?;
        Self::from_adjacency(ctx, doc, propagation)
    }

    fn intern(&mut self, id: NodeId, predicates: Option<PredicateSet>) -> usize {
        if let Some(&i) = self.index.get(&id) {
            if let Some(p) = predicates {
                if self.predicates[i].is_empty() {
                    self.predicates[i] = p;
                }
            }
            return i;
        }
        let i = self.ids.len();
        if predicates.is_none() {
            debug!(node = %id, "Edge target not listed among nodes");
        }
        self.index.insert(id.clone(), i);
        self.ids.push(id);
        self.predicates.push(predicates.unwrap_or_default());
        self.out.push(Vec::new());
        i
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn predicates(&self, id: &NodeId) -> Result<&PredicateSet> {
        let i = self.position(id)?;
        Ok(&self.predicates[i])
    }

    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.index
            .get(id)
            .map(|&u| self.out[u].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&v| &self.ids[v])
    }

    pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&u), Some(v)) => self.out[u].contains(v),
            _ => false,
        }
    }

    /// Transition gating `from → to`; edges without one are always enabled.
    pub fn transition(&self, from: &NodeId, to: &NodeId) -> Option<&TransitionStatement> {
        let (u, v) = (*self.index.get(from)?, *self.index.get(to)?);
        self.transitions.get(&(u, v))
    }

    /// Evaluate `criterion` against the predicates of `node`.
    pub fn satisfies(&self, node: &NodeId, criterion: &TransitionStatement) -> Result<bool> {
        Ok(criterion.evaluate(self.predicates(node)?))
    }

    /// The edge exists and its transition holds on the destination.
    pub fn is_enabled(&self, from: &NodeId, to: &NodeId) -> Result<bool> {
        let u = self.position(from)?;
        let v = self.position(to)?;
        if !self.out[u].contains(&v) {
            return Ok(false);
        }
        Ok(self
            .transitions
            .get(&(u, v))
            .is_none_or(|t| t.evaluate(&self.predicates[v])))
    }

    /// Cheapest route from `source` to every reachable node. Entering a node
    /// in `visited` costs the revisit penalty; routes above the cutoff are
    /// dropped. `source` maps to a zero-cost route to itself. Empty when
    /// `source` is not in the graph.
    pub fn propagate(&self, source: &NodeId, visited: &HashSet<NodeId>) -> HashMap<NodeId, Route> {
        let Some(&s) = self.index.get(source) else {
            return HashMap::new();
        };
        let routes = propagation::shortest_routes(&self.topology(), s, visited, &self.propagation);
        debug!(source = %source, reached = routes.len(), "Propagated");
        routes
    }

    /// Direct successors of `source` outside `visited`, one hop each.
    pub fn propagate_one_step(&self, source: &NodeId, visited: &HashSet<NodeId>) -> HashMap<NodeId, Route> {
        match self.index.get(source) {
            Some(&s) => propagation::frontier(&self.topology(), s, visited),
            None => HashMap::new(),
        }
    }

    fn topology(&self) -> Topology<'_> {
        Topology { ids: &self.ids, successors: &self.out }
    }

    fn position(&self, id: &NodeId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("Node {id} is not in the behavior graph")))
    }
}

impl fmt::Display for BehaviorIGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BIGr(N={}, E={})", self.node_count(), self.edge_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> NodeId {
        NodeId::new("r", name).at(10)
    }

    fn graph() -> BehaviorIGraph {
        let mut doc = AdjacencyDoc::new();
        let a = doc.push_node(id("a"), PredicateSet::new().with("open", true));
        let b = doc.push_node(id("b"), PredicateSet::new().with("speed.value", 4));
        doc.push_node(id("c"), PredicateSet::new());
        doc.push_edge(a, id("b"), Some("speed.value > 3".into()));
        doc.push_edge(a, id("c"), None);
        doc.push_edge(b, id("c"), Some("open = true".into()));
        BehaviorIGraph::from_adjacency(&Context::default(), doc, PropagationConfig::default()).unwrap()
    }

    #[test]
    fn test_construction_counts() {
        let g = graph();
        assert_eq!(g.to_string(), "BIGr(N=3, E=3)");
        assert!(g.has_edge(&id("a"), &id("b")));
        assert!(!g.has_edge(&id("b"), &id("a")));
    }

    #[test]
    fn test_accessors() {
        let g = graph();
        assert_eq!(g.node_ids(), &[id("a"), id("b"), id("c")]);

        let next: Vec<_> = g.successors(&id("a")).cloned().collect();
        assert_eq!(next, vec![id("b"), id("c")]);
        assert_eq!(g.successors(&id("c")).count(), 0);
        assert_eq!(g.successors(&id("zz")).count(), 0);

        assert_eq!(g.transition(&id("a"), &id("b")).map(|t| t.source()), Some("speed.value > 3"));
        assert!(g.transition(&id("a"), &id("c")).is_none());
        assert!(g.transition(&id("c"), &id("a")).is_none());
    }

    #[test]
    fn test_satisfies() {
        let g = graph();
        let open = TransitionStatement::parse("open = true").unwrap();
        assert!(g.satisfies(&id("a"), &open).unwrap());
        assert!(!g.satisfies(&id("b"), &open).unwrap());
        assert!(matches!(g.satisfies(&id("zz"), &open), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_is_enabled() {
        let g = graph();
        assert!(g.is_enabled(&id("a"), &id("b")).unwrap());
        assert!(g.is_enabled(&id("a"), &id("c")).unwrap());
        // c has no "open" predicate.
        assert!(!g.is_enabled(&id("b"), &id("c")).unwrap());
        assert!(!g.is_enabled(&id("c"), &id("a")).unwrap());
        assert!(g.is_enabled(&id("a"), &id("zz")).is_err());
    }

    #[test]
    fn test_unknown_source_yields_nothing() {
        let g = graph();
        assert!(g.propagate(&id("zz"), &HashSet::new()).is_empty());
        assert!(g.propagate_one_step(&id("zz"), &HashSet::new()).is_empty());
    }

    #[test]
    fn test_source_in_visited_keeps_zero_route() {
        let g = graph();
        let visited: HashSet<NodeId> = [id("a")].into_iter().collect();
        let routes = g.propagate(&id("a"), &visited);
        assert_eq!(routes[&id("a")].cost, 0);
        assert_eq!(routes[&id("a")].path.to_vec(), vec![id("a")]);
        assert_eq!(routes[&id("c")].cost, 1);
    }

    #[test]
    fn test_one_step_excludes_visited() {
        let g = graph();
        let visited: HashSet<NodeId> = [id("b")].into_iter().collect();
        let routes = g.propagate_one_step(&id("a"), &visited);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[&id("c")].path.to_vec(), vec![id("a"), id("c")]);
    }

    #[test]
    fn test_implicit_edge_target() {
        let json = r#"{
            "nodes": [{"id": {"regionId": "r", "polygonId": "a"}, "predicates": {"x": 1}}],
            "adjacency": [[{"id": {"regionId": "r", "polygonId": "ghost"}}]]
        }"#;
        let g = BehaviorIGraph::from_json(&Context::default(), json, PropagationConfig::default()).unwrap();
        assert_eq!(g.node_count(), 2);
        assert!(g.predicates(&NodeId::new("r", "ghost")).unwrap().is_empty());
    }

    #[test]
    fn test_bad_transition_text_is_rejected() {
        let mut doc = AdjacencyDoc::new();
        let a = doc.push_node(id("a"), PredicateSet::new());
        doc.push_edge(a, id("b"), Some("speed.value >".into()));
        let err = BehaviorIGraph::from_adjacency(&Context::default(), doc, PropagationConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SyntaxError { .. }));
    }
}
