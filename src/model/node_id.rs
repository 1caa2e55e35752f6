//! Node identity and the explicit key derivations used to compare it.
//!
//! A [`NodeId`] is the full composite key. Call sites that need to match
//! identities across snapshots or branches derive a narrower key instead of
//! relying on a relaxed equality:
//!
//! | Key | Ignores | Used for |
//! |-----|---------|----------|
//! | [`NodeId`] | nothing | graph membership inside one BIGraph |
//! | [`NodeId::sans_branch`] | `h_index` | connectivity-graph membership |
//! | [`SpatialKey`] | time, `h_index` | same area across snapshots |
//! | [`SourceKey`] | time, `h_index`, sub-part | map/sensor index lookups |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite identity of a spatial entity / graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeId {
    pub region_id: String,
    pub polygon_id: String,
    #[serde(default)]
    pub sub_part_id: String,
    #[serde(default)]
    pub time_nano_secs: i64,
    /// Branch index for parallel hypothetical futures. `None` on the wire is
    /// either an absent field or `-1`.
    #[serde(default, with = "branch_index")]
    pub h_index: Option<u32>,
}

/// Identity of an area irrespective of when or on which branch it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpatialKey {
    pub region_id: String,
    pub polygon_id: String,
    pub sub_part_id: String,
}

/// Identity of the logical source polygon (before partitioning).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub region_id: String,
    pub polygon_id: String,
}

impl NodeId {
    pub fn new(region_id: impl Into<String>, polygon_id: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            polygon_id: polygon_id.into(),
            sub_part_id: String::new(),
            time_nano_secs: 0,
            h_index: None,
        }
    }

    pub fn with_sub_part(mut self, sub_part_id: impl Into<String>) -> Self {
        self.sub_part_id = sub_part_id.into();
        self
    }

    pub fn at(mut self, time_nano_secs: i64) -> Self {
        self.time_nano_secs = time_nano_secs;
        self
    }

    pub fn on_branch(mut self, h_index: Option<u32>) -> Self {
        self.h_index = h_index;
        self
    }

    /// Same identity with the branch index cleared.
    pub fn sans_branch(&self) -> NodeId {
        self.clone().on_branch(None)
    }

    pub fn spatial_key(&self) -> SpatialKey {
        SpatialKey {
            region_id: self.region_id.clone(),
            polygon_id: self.polygon_id.clone(),
            sub_part_id: self.sub_part_id.clone(),
        }
    }

    pub fn source_key(&self) -> SourceKey {
        SourceKey {
            region_id: self.region_id.clone(),
            polygon_id: self.polygon_id.clone(),
        }
    }

    /// The snapshot instant as a UTC timestamp.
    pub fn instant(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.time_nano_secs)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region_id, self.polygon_id)?;
        if !self.sub_part_id.is_empty() {
            let short: String = self.sub_part_id.chars().take(6).collect();
            write!(f, "#{short}")?;
        }
        write!(f, "@{}", self.time_nano_secs)?;
        if let Some(h) = self.h_index {
            write!(f, "[h{h}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region_id, self.polygon_id)
    }
}

/// `hIndex` travels as a signed integer where any negative value means "no branch".
mod branch_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(h) => s.serialize_i64(i64::from(*h)),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw = Option::<i64>::deserialize(d)?;
        Ok(raw.and_then(|h| u32::try_from(h).ok()))
    }
}
