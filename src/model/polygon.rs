//! Spatial entities: typed polygons with identity and predicates.
//!
//! Shared attributes live in [`SpatialEntity`]; variant-only data (center of
//! rotation, tracklets) lives in the [`PolygonKind`] arm. Code that cares
//! about the variant matches on `kind` instead of dispatching virtually.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use super::{NodeId, PredicateSet, Tracklet};

/// Variant tag plus variant-only fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolygonKind {
    /// Fixed map region.
    Static,
    /// Map region under an affine motion.
    Moving {
        #[serde(rename = "centerOfRotation")]
        center_of_rotation: Coord<f64>,
    },
    /// Sensor footprint, with the targets observed in it this step.
    Sensing {
        #[serde(rename = "centerOfRotation")]
        center_of_rotation: Coord<f64>,
        #[serde(default)]
        tracklets: Vec<Tracklet>,
    },
}

impl PolygonKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolygonKind::Static => "static",
            PolygonKind::Moving { .. } => "moving",
            PolygonKind::Sensing { .. } => "sensing",
        }
    }
}

/// A typed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialEntity {
    pub id: NodeId,
    /// Ordered outer ring as supplied by the producer.
    pub boundary: LineString<f64>,
    /// Interior geometry; may hold several components.
    pub interior: MultiPolygon<f64>,
    #[serde(default)]
    pub predicates: PredicateSet,
    /// Obstacles and no-access regions are excluded from connectivity.
    #[serde(default = "accessible_by_default")]
    pub accessible: bool,
    #[serde(flatten)]
    pub kind: PolygonKind,
}

fn accessible_by_default() -> bool {
    true
}

impl SpatialEntity {
    /// Build an entity whose interior is the polygon bounded by `boundary`.
    pub fn from_boundary(id: NodeId, boundary: Vec<(f64, f64)>, kind: PolygonKind) -> Self {
        let ring: LineString<f64> = boundary.into();
        let interior = MultiPolygon::new(vec![Polygon::new(ring.clone(), Vec::new())]);
        Self {
            id,
            boundary: ring,
            interior,
            predicates: PredicateSet::new(),
            accessible: true,
            kind,
        }
    }

    /// Build an entity from an already computed interior component.
    pub fn from_interior(id: NodeId, interior: Polygon<f64>, kind: PolygonKind) -> Self {
        Self {
            id,
            boundary: interior.exterior().clone(),
            interior: MultiPolygon::new(vec![interior]),
            predicates: PredicateSet::new(),
            accessible: true,
            kind,
        }
    }

    pub fn static_region(id: NodeId, boundary: Vec<(f64, f64)>) -> Self {
        Self::from_boundary(id, boundary, PolygonKind::Static)
    }

    pub fn sensing_region(id: NodeId, boundary: Vec<(f64, f64)>, tracklets: Vec<Tracklet>) -> Self {
        Self::from_boundary(
            id,
            boundary,
            PolygonKind::Sensing { center_of_rotation: Coord { x: 0.0, y: 0.0 }, tracklets },
        )
    }

    pub fn with_predicates(mut self, predicates: PredicateSet) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    pub fn is_sensing(&self) -> bool {
        matches!(self.kind, PolygonKind::Sensing { .. })
    }

    /// Static and moving polygons describe the map.
    pub fn is_map(&self) -> bool {
        !self.is_sensing()
    }

    pub fn tracklets(&self) -> &[Tracklet] {
        match &self.kind {
            PolygonKind::Sensing { tracklets, .. } => tracklets,
            _ => &[],
        }
    }

    pub fn has_track(&self) -> bool {
        !self.tracklets().is_empty()
    }

    /// Some observed target entered this region this step.
    pub fn track_entered(&self) -> bool {
        self.tracklets().iter().any(|t| t.entered)
    }

    /// Some observed target left this region this step.
    pub fn track_exited(&self) -> bool {
        self.tracklets().iter().any(|t| t.exited)
    }
}
