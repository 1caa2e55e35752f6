//! Tracklet: a target observation inside a sensing region.

use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

/// A tracked target's observed state this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracklet {
    pub id: String,
    pub position: Coord<f64>,
    pub time_nano_secs: i64,
    /// The target crossed into the sensed area this step.
    #[serde(default)]
    pub entered: bool,
    /// The target crossed out of the sensed area this step.
    #[serde(default)]
    pub exited: bool,
}

impl Tracklet {
    pub fn new(id: impl Into<String>, x: f64, y: f64, time_nano_secs: i64) -> Self {
        Self {
            id: id.into(),
            position: Coord { x, y },
            time_nano_secs,
            entered: false,
            exited: false,
        }
    }

    pub fn entering(mut self) -> Self {
        self.entered = true;
        self
    }

    pub fn exiting(mut self) -> Self {
        self.exited = true;
        self
    }

    pub fn point(&self) -> Point<f64> {
        Point::from(self.position)
    }
}
