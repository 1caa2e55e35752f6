//! # rt-bi: Runtime Behavior Inference
//!
//! Reasoning about what a robot could have done while it was only partly
//! observed.
//!
//! ## Design Principles
//!
//! 1. **Snapshots, not patches**: every batch of polygons yields a fresh
//!    `ConnectivityGraph`; readers swap whole snapshots via `SnapshotCell`
//! 2. **Clean DTOs**: `NodeId`, `SpatialEntity`, `PredicateSet` cross all boundaries
//! 3. **Parser owns nothing**: predicate text → parse tree is a pure function
//! 4. **Explicit context**: loggers are passed in as a `Context`, never global
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rt_bi::{BehaviorIGraph, ConnectivityGraph, Config, Context, NodeId, SpatialEntity, Tracklet};
//!
//! # fn example() -> rt_bi::Result<()> {
//! let ctx = Context::new("eventifier");
//! let config = Config::default();
//!
//! let map = SpatialEntity::static_region(
//!     NodeId::new("map", "room"),
//!     vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)],
//! );
//! let camera = SpatialEntity::sensing_region(
//!     NodeId::new("sensors", "cam"),
//!     vec![(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0), (0.0, 0.0)],
//!     vec![Tracklet::new("t1", 2.0, 2.0, 0).entering()],
//! );
//!
//! let cgraph = ConnectivityGraph::build(&ctx, &config.builder, 0, vec![map], vec![camera])?;
//! let bigraph = BehaviorIGraph::from_json(&ctx, &cgraph.to_json()?, config.propagation)?;
//! println!("{cgraph} -> {bigraph}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Partition sensed/unsensed space | [`cgraph`] | `ConnectivityGraph` |
//! | Reachability and predicate checks | [`bigraph`] | `Route`s, `bool` |
//! | Predicate text → SPARQL fragments | [`predicate`] | `CompiledPredicate` |
//! | Fragments → truth values | [`store`] | `PredicateSet` |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod geometry;
pub mod config;
pub mod context;
pub mod predicate;
pub mod transition;
pub mod cgraph;
pub mod bigraph;
pub mod store;
pub mod snapshot;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    NodeId, SpatialKey, SourceKey,
    PredicateSet, PredicateValue,
    SpatialEntity, PolygonKind, Tracklet,
};

// ============================================================================
// Re-exports: Graphs
// ============================================================================

pub use cgraph::{ConnectivityGraph, NodeRole};
pub use bigraph::{BehaviorIGraph, Route};
pub use bigraph::adjacency::AdjacencyDoc;
pub use transition::TransitionStatement;

// ============================================================================
// Re-exports: Compiler and store
// ============================================================================

pub use predicate::{CompiledPredicate, PredicateCompiler, TemplateSource};
pub use store::{QueryStore, Bindings};

// ============================================================================
// Re-exports: Ambient
// ============================================================================

pub use config::{Config, BuilderConfig, PropagationConfig, CompilerConfig, Namespace};
pub use context::Context;
pub use snapshot::SnapshotCell;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Predicate syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Malformed {rule}: expected {expected} children, got {got}")]
    Arity { rule: String, expected: usize, got: usize },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Triple store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
