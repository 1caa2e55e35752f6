//! End-to-end tests for behavior-graph propagation.
//!
//! Graphs are built from adjacency documents, the same way they arrive from
//! the graph builder.

use hashbrown::HashSet;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use rt_bi::{AdjacencyDoc, BehaviorIGraph, Context, NodeId, PredicateSet, PropagationConfig};

// ============================================================================
// Helpers
// ============================================================================

fn id(i: usize) -> NodeId {
    NodeId::new("r", format!("n{i}")).at(5)
}

fn graph(n: usize, edges: &[(usize, usize)]) -> BehaviorIGraph {
    let mut doc = AdjacencyDoc::new();
    for i in 0..n {
        doc.push_node(id(i), PredicateSet::new());
    }
    for &(u, v) in edges {
        doc.push_edge(u, id(v), None);
    }
    BehaviorIGraph::from_adjacency(&Context::new("test"), doc, PropagationConfig::default()).unwrap()
}

fn visited(ids: &[usize]) -> HashSet<NodeId> {
    ids.iter().map(|&i| id(i)).collect()
}

// ============================================================================
// 1. Revisit tolerance
// ============================================================================

#[test]
fn test_only_path_through_visited_node() {
    // 0 → 1 → 2, with 1 already explored.
    let g = graph(3, &[(0, 1), (1, 2)]);
    let seen = visited(&[1]);

    let full = g.propagate(&id(0), &seen);
    let to_y = &full[&id(2)];
    assert_eq!(to_y.path.to_vec(), vec![id(0), id(1), id(2)]);
    assert_eq!(to_y.cost, 1_000_001);

    let one = g.propagate_one_step(&id(0), &seen);
    assert!(one.is_empty());
}

#[test]
fn test_fresh_detour_beats_revisit() {
    // 0 → 1 → 3 and 0 → 2 → 4 → 3, with 1 visited.
    let g = graph(5, &[(0, 1), (1, 3), (0, 2), (2, 4), (4, 3)]);
    let routes = g.propagate(&id(0), &visited(&[1]));
    assert_eq!(routes[&id(3)].cost, 3);
    assert_eq!(routes[&id(3)].path.to_vec(), vec![id(0), id(2), id(4), id(3)]);
}

#[test]
fn test_two_revisits_exceed_cutoff() {
    let g = graph(3, &[(0, 1), (1, 2)]);
    let routes = g.propagate(&id(0), &visited(&[1, 2]));
    assert!(routes.contains_key(&id(1)));
    assert!(!routes.contains_key(&id(2)));
}

#[test]
fn test_cycle_back_to_source() {
    let g = graph(2, &[(0, 1), (1, 0)]);
    let routes = g.propagate(&id(0), &visited(&[0]));
    assert_eq!(routes[&id(0)].cost, 0);
    assert_eq!(routes[&id(1)].cost, 1);
}

#[test]
fn test_custom_penalty() {
    let mut doc = AdjacencyDoc::new();
    let a = doc.push_node(id(0), PredicateSet::new());
    doc.push_node(id(1), PredicateSet::new());
    doc.push_edge(a, id(1), None);
    let config = PropagationConfig { revisit_penalty: 10, cutoff: 20 };
    let g = BehaviorIGraph::from_adjacency(&Context::default(), doc, config).unwrap();
    assert_eq!(g.propagate(&id(0), &visited(&[1]))[&id(1)].cost, 10);
}

// ============================================================================
// 2. Properties
// ============================================================================

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
    (2usize..12).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..(n * 3)),
            prop::collection::vec(0..n, 0..n),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_one_step_is_subset_of_full((n, edges, seen) in graph_strategy()) {
        let g = graph(n, &edges);
        let seen = visited(&seen);
        let full = g.propagate(&id(0), &seen);
        let one = g.propagate_one_step(&id(0), &seen);
        for dest in one.keys() {
            prop_assert!(full.contains_key(dest), "{} missing from full propagation", dest);
            prop_assert!(!seen.contains(dest));
        }
    }

    #[test]
    fn prop_routes_follow_edges((n, edges, seen) in graph_strategy()) {
        let g = graph(n, &edges);
        let seen = visited(&seen);
        let config = PropagationConfig::default();
        for (dest, route) in g.propagate(&id(0), &seen) {
            prop_assert_eq!(route.path.first(), Some(&id(0)));
            prop_assert_eq!(route.destination(), Some(&dest));
            prop_assert!(route.cost <= config.cutoff);
            let mut cost = 0;
            for step in route.path.windows(2) {
                prop_assert!(g.has_edge(&step[0], &step[1]));
                cost += if seen.contains(&step[1]) { config.revisit_penalty } else { 1 };
            }
            prop_assert_eq!(cost, route.cost);
        }
    }
}
