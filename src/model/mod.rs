//! # Spatial Entity Model
//!
//! Clean DTOs shared by the connectivity-graph builder, the behavior interval
//! graph and the predicate compiler.
//!
//! Design rule: pure data. No I/O, no logging, no graph state.

pub mod node_id;
pub mod predicates;
pub mod tracklet;
pub mod polygon;

pub use node_id::{NodeId, SpatialKey, SourceKey};
pub use predicates::{PredicateSet, PredicateValue};
pub use tracklet::Tracklet;
pub use polygon::{SpatialEntity, PolygonKind};
