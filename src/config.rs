//! Tunables for the builder, the propagation search and the compiler.
//!
//! All structs deserialize from JSON with every field optional; anything
//! left out keeps its default.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Connectivity-graph construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// An exited tracklet stays attached to an anti-shadow within this
    /// distance of it.
    pub tracklet_exit_distance: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { tracklet_exit_distance: 5.0 }
    }
}

/// Full propagation search costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Cost of an edge into an already visited node.
    pub revisit_penalty: u64,
    /// Routes costing more than this are dropped.
    pub cutoff: u64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self { revisit_penalty: 1_000_000, cutoff: 1_000_001 }
    }
}

/// Which family of predicates a compiler handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    #[default]
    Spatial,
    Temporal,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Spatial => f.write_str("spatial"),
            Namespace::Temporal => f.write_str("temporal"),
        }
    }
}

/// Predicate compiler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub namespace: Namespace,
    /// Directory holding `<query_name>.sparql` templates.
    pub sparql_dir: PathBuf,
    pub selector_placeholder: String,
    pub variables_placeholder: String,
    pub order_placeholder: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            namespace: Namespace::Spatial,
            sparql_dir: PathBuf::from("sparql"),
            selector_placeholder: "#SELECTOR".into(),
            variables_placeholder: "#VARIABLES".into(),
            order_placeholder: "#ORDER".into(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub builder: BuilderConfig,
    pub propagation: PropagationConfig,
    pub compiler: CompilerConfig,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
