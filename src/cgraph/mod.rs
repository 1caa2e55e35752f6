//! # Connectivity Graph
//!
//! One snapshot of sensed and unsensed space at a single instant.
//!
//! Nodes are the **shadows** (connected components of the map outside every
//! sensor) and **anti-shadows** (components of map ∩ sensor). Edges follow
//! spatial adjacency, except that an edge crossing the sensed/unsensed
//! boundary only exists in the step where a tracklet actually crosses it.
//!
//! A snapshot is built in one go and never mutated afterwards; a new batch
//! of polygons produces a new snapshot.

pub mod builder;

use std::fmt;

use hashbrown::HashMap;
use tracing::{info, warn};

use crate::bigraph::adjacency::AdjacencyDoc;
use crate::config::BuilderConfig;
use crate::context::Context;
use crate::model::{NodeId, SourceKey, SpatialEntity};
use crate::{Error, Result};

/// Which side of the sensing boundary a node lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Shadow,
    AntiShadow,
}

pub struct ConnectivityGraph {
    time_nano_secs: i64,
    h_index: Option<u32>,
    map: Vec<SpatialEntity>,
    map_index: HashMap<SourceKey, usize>,
    sensors: Vec<SpatialEntity>,
    sensor_index: HashMap<SourceKey, usize>,
    /// Shadows first, then anti-shadows.
    nodes: Vec<SpatialEntity>,
    shadow_count: usize,
    /// Keyed by sans-branch id.
    node_index: HashMap<NodeId, usize>,
    /// Out-edges by node position.
    edges: Vec<Vec<usize>>,
}

impl ConnectivityGraph {
    /// Build the snapshot for one batch of map and sensing polygons.
    pub fn build(
        ctx: &Context,
        config: &BuilderConfig,
        time_nano_secs: i64,
        map: Vec<SpatialEntity>,
        sensors: Vec<SpatialEntity>,
    ) -> Result<Self> {
        Self::build_on_branch(ctx, config, time_nano_secs, None, map, sensors)
    }

    /// Like [`build`](Self::build), stamping `h_index` onto every produced node.
    pub fn build_on_branch(
        ctx: &Context,
        config: &BuilderConfig,
        time_nano_secs: i64,
        h_index: Option<u32>,
        map: Vec<SpatialEntity>,
        sensors: Vec<SpatialEntity>,
    ) -> Result<Self> {
        let _guard = ctx.span().enter();
        info!(time_nano_secs, ?h_index, "Constructing connectivity graph");

        builder::check_roles(&map, &sensors)?;
        let map_index = index_by_source(&map);
        info!(count = map.len(), "Stored map polygons");
        let sensor_index = index_by_source(&sensors);
        info!(count = sensors.len(), "Stored sensors");

        let partition = builder::partition(&map, &sensors, time_nano_secs, h_index, config.tracklet_exit_distance);
        if partition.shadows.is_empty() {
            warn!(time_nano_secs, "No shadows produced");
        }
        info!(
            shadows = partition.shadows.len(),
            anti_shadows = partition.anti_shadows.len(),
            "Constructed shadows and anti-shadows"
        );

        let shadow_count = partition.shadows.len();
        let mut nodes = partition.shadows;
        nodes.extend(partition.anti_shadows);
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.sans_branch(), i))
            .collect();
        let edges = builder::connect(&nodes);

        let graph = Self {
            time_nano_secs,
            h_index,
            map,
            map_index,
            sensors,
            sensor_index,
            nodes,
            shadow_count,
            node_index,
            edges,
        };
        info!(graph = %graph, "Connectivity graph ready");
        Ok(graph)
    }

    /// Copy of this snapshot with every stored id placed on branch `h_index`.
    pub fn with_h_index(&self, h_index: u32) -> Self {
        let restamp = |polys: &[SpatialEntity]| -> Vec<SpatialEntity> {
            polys
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    p.id = p.id.on_branch(Some(h_index));
                    p
                })
                .collect()
        };
        Self {
            time_nano_secs: self.time_nano_secs,
            h_index: Some(h_index),
            map: restamp(&self.map),
            map_index: self.map_index.clone(),
            sensors: restamp(&self.sensors),
            sensor_index: self.sensor_index.clone(),
            nodes: restamp(&self.nodes),
            shadow_count: self.shadow_count,
            node_index: self.node_index.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn time_nano_secs(&self) -> i64 {
        self.time_nano_secs
    }

    pub fn h_index(&self) -> Option<u32> {
        self.h_index
    }

    pub fn map(&self) -> &[SpatialEntity] {
        &self.map
    }

    pub fn sensors(&self) -> &[SpatialEntity] {
        &self.sensors
    }

    pub fn shadows(&self) -> &[SpatialEntity] {
        &self.nodes[..self.shadow_count]
    }

    pub fn anti_shadows(&self) -> &[SpatialEntity] {
        &self.nodes[self.shadow_count..]
    }

    /// Every node, shadows first.
    pub fn nodes(&self) -> &[SpatialEntity] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Membership ignores the branch index.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(&id.sans_branch())
    }

    pub fn node(&self, id: &NodeId) -> Option<&SpatialEntity> {
        self.position(id).map(|i| &self.nodes[i])
    }

    pub fn role(&self, id: &NodeId) -> Option<NodeRole> {
        self.position(id).map(|i| {
            if i < self.shadow_count {
                NodeRole::Shadow
            } else {
                NodeRole::AntiShadow
            }
        })
    }

    pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        match (self.position(from), self.position(to)) {
            (Some(u), Some(v)) => self.edges[u].contains(&v),
            _ => false,
        }
    }

    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = &SpatialEntity> + '_ {
        self.position(id)
            .map(|u| self.edges[u].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&v| &self.nodes[v])
    }

    /// Every edge as `(from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = (&SpatialEntity, &SpatialEntity)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .flat_map(move |(u, out)| out.iter().map(move |&v| (&self.nodes[u], &self.nodes[v])))
    }

    pub fn sensor(&self, id: &NodeId) -> Result<&SpatialEntity> {
        self.sensor_index
            .get(&id.source_key())
            .map(|&i| &self.sensors[i])
            .ok_or_else(|| Error::NotFound(format!("Sensor has gone missing: {id}")))
    }

    pub fn has_sensor(&self, id: &NodeId) -> bool {
        self.sensor_index.contains_key(&id.source_key())
    }

    pub fn map_polygon(&self, id: &NodeId) -> Result<&SpatialEntity> {
        self.map_index
            .get(&id.source_key())
            .map(|&i| &self.map[i])
            .ok_or_else(|| Error::NotFound(format!("Map polygon has gone missing: {id}")))
    }

    /// The snapshot as an adjacency document.
    pub fn to_adjacency(&self) -> AdjacencyDoc {
        let mut doc = AdjacencyDoc::new();
        for node in &self.nodes {
            doc.push_node(node.id.clone(), node.predicates.clone());
        }
        for (u, out) in self.edges.iter().enumerate() {
            for &v in out {
                doc.push_edge(u, self.nodes[v].id.clone(), None);
            }
        }
        doc
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_adjacency())?)
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(&id.sans_branch()).copied()
    }
}

fn index_by_source(polys: &[SpatialEntity]) -> HashMap<SourceKey, usize> {
    polys
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.source_key(), i))
        .collect()
}

impl fmt::Display for ConnectivityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CGr-{}(N={}, E={})", self.time_nano_secs, self.node_count(), self.edge_count())
    }
}

impl fmt::Debug for ConnectivityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityGraph")
            .field("time_nano_secs", &self.time_nano_secs)
            .field("h_index", &self.h_index)
            .field("shadows", &self.shadow_count)
            .field("anti_shadows", &(self.nodes.len() - self.shadow_count))
            .field("edges", &self.edge_count())
            .finish()
    }
}
