//! Reachability propagation over a behavior interval graph.
//!
//! Full propagation is a single-source Dijkstra where stepping into an
//! already visited node costs a large penalty instead of one hop. One-step
//! propagation only expands the frontier.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::PropagationConfig;
use crate::model::NodeId;

/// Cheapest known way to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Source first, destination last.
    pub path: SmallVec<[NodeId; 4]>,
    /// Hops, with revisits counted at the penalty.
    pub cost: u64,
}

impl Route {
    pub fn destination(&self) -> Option<&NodeId> {
        self.path.last()
    }

    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Read-only adjacency view the search runs on.
pub(crate) struct Topology<'g> {
    pub ids: &'g [NodeId],
    /// Out-neighbours by node position.
    pub successors: &'g [Vec<usize>],
}

/// Minimum-cost routes from `source` to every destination within the
/// cutoff, `source` itself included at cost zero.
pub(crate) fn shortest_routes(
    topo: &Topology<'_>,
    source: usize,
    visited: &HashSet<NodeId>,
    config: &PropagationConfig,
) -> HashMap<NodeId, Route> {
    let n = topo.ids.len();
    let mut dist: Vec<Option<u64>> = vec![None; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source] = Some(0);
    heap.push(Reverse((0u64, source)));

    while let Some(Reverse((cost, u))) = heap.pop() {
        if dist[u].is_some_and(|d| cost > d) {
            continue;
        }
        for &v in &topo.successors[u] {
            let weight = if visited.contains(&topo.ids[v]) { config.revisit_penalty } else { 1 };
            let next = cost.saturating_add(weight);
            if next > config.cutoff {
                continue;
            }
            if dist[v].is_none_or(|d| next < d) {
                dist[v] = Some(next);
                prev[v] = Some(u);
                heap.push(Reverse((next, v)));
            }
        }
    }

    dist.iter()
        .enumerate()
        .filter_map(|(v, d)| d.map(|cost| (v, cost)))
        .map(|(v, cost)| {
            let mut path: SmallVec<[NodeId; 4]> = SmallVec::new();
            let mut at = Some(v);
            while let Some(i) = at {
                path.push(topo.ids[i].clone());
                at = prev[i];
            }
            path.reverse();
            (topo.ids[v].clone(), Route { path, cost })
        })
        .collect()
}

/// Direct successors of `source` that are not in `visited`.
pub(crate) fn frontier(
    topo: &Topology<'_>,
    source: usize,
    visited: &HashSet<NodeId>,
) -> HashMap<NodeId, Route> {
    topo.successors[source]
        .iter()
        .map(|&v| &topo.ids[v])
        .filter(|id| !visited.contains(*id))
        .map(|id| {
            let path: SmallVec<[NodeId; 4]> = smallvec::smallvec![topo.ids[source].clone(), id.clone()];
            (id.clone(), Route { path, cost: 1 })
        })
        .collect()
}
