//! Shadow / anti-shadow partitioning and edge synthesis.
//!
//! The builder is a set of pure functions over one batch of polygons. The
//! [`ConnectivityGraph`](super::ConnectivityGraph) constructor calls them in
//! order: check roles, partition, connect.

use geo_types::MultiPolygon;
use uuid::Uuid;

use crate::geometry;
use crate::model::{NodeId, PolygonKind, SpatialEntity, Tracklet};
use crate::{Error, Result};

/// Fresh sub-part identifier. Not stable across snapshots.
pub fn fresh_sub_part_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Map inputs must be static or moving, sensor inputs must be sensing.
pub fn check_roles(map: &[SpatialEntity], sensors: &[SpatialEntity]) -> Result<()> {
    if let Some(bad) = map.iter().find(|p| !p.is_map()) {
        return Err(Error::Precondition(format!(
            "Unexpected {} polygon {} among map polygons",
            bad.kind.name(),
            bad.id
        )));
    }
    if let Some(bad) = sensors.iter().find(|p| !p.is_sensing()) {
        return Err(Error::Precondition(format!(
            "Unexpected {} polygon {} among sensing polygons",
            bad.kind.name(),
            bad.id
        )));
    }
    Ok(())
}

/// Output of [`partition`].
#[derive(Debug, Default)]
pub struct Partition {
    pub shadows: Vec<SpatialEntity>,
    pub anti_shadows: Vec<SpatialEntity>,
}

/// Split the map into sensed (anti-shadow) and unsensed (shadow) components.
///
/// Overlapping sensors never yield overlapping anti-shadows: a sensor only
/// claims the part of its field of view no earlier sensor in `sensors`
/// covers, so shared space belongs to the first sensor listed.
///
/// Every produced polygon inherits its predicates and accessibility from the
/// map polygon it was cut from, and is stamped with `time_nano_secs` and
/// `h_index`.
pub fn partition(
    map: &[SpatialEntity],
    sensors: &[SpatialEntity],
    time_nano_secs: i64,
    h_index: Option<u32>,
    exit_distance: f64,
) -> Partition {
    let stamp = |source: &NodeId| {
        NodeId::new(source.region_id.clone(), source.polygon_id.clone())
            .with_sub_part(fresh_sub_part_id())
            .at(time_nano_secs)
            .on_branch(h_index)
    };
    let inherit = |mut part: SpatialEntity, from: &SpatialEntity| {
        part.predicates = from.predicates.clone();
        part.accessible = from.accessible;
        part
    };

    let mut out = Partition::default();

    if sensors.is_empty() {
        for region in map {
            let mut shadow = region.clone();
            shadow.id = stamp(&region.id);
            out.shadows.push(shadow);
        }
        return out;
    }

    // Space already claimed by an earlier sensor.
    let mut covered = MultiPolygon::<f64>::new(Vec::new());
    for sensor in sensors {
        let center_of_rotation = match &sensor.kind {
            PolygonKind::Sensing { center_of_rotation, .. } => *center_of_rotation,
            _ => continue,
        };
        let claimed = geometry::difference(&sensor.interior, &covered);
        covered = geometry::union(&covered, &sensor.interior);
        for region in map {
            let sensed = geometry::intersection(&region.interior, &claimed);
            for component in geometry::components(sensed) {
                let tracklets = extract_tracklets(sensor, &component, exit_distance);
                let kind = PolygonKind::Sensing { center_of_rotation, tracklets };
                let anti = SpatialEntity::from_interior(stamp(&sensor.id), component, kind);
                out.anti_shadows.push(inherit(anti, region));
            }
        }
    }

    for region in map {
        let unsensed = sensors
            .iter()
            .fold(region.interior.clone(), |rest, sensor| geometry::difference(&rest, &sensor.interior));
        for component in geometry::components(unsensed) {
            let shadow = SpatialEntity::from_interior(stamp(&region.id), component, region.kind.clone());
            out.shadows.push(inherit(shadow, region));
        }
    }

    out
}

/// The tracklets of `sensor` that belong to one of its sensed components.
///
/// A tracklet still in view belongs to the component containing it. A
/// tracklet that exited this step belongs to every component within
/// `exit_distance` of it.
pub fn extract_tracklets(
    sensor: &SpatialEntity,
    component: &geo_types::Polygon<f64>,
    exit_distance: f64,
) -> Vec<Tracklet> {
    sensor
        .tracklets()
        .iter()
        .filter(|t| {
            let p = t.point();
            if t.exited {
                geometry::distance_to(component, &p) <= exit_distance
            } else {
                geometry::contains_point(component, &p)
            }
        })
        .cloned()
        .collect()
}

/// Role rule for a directed edge `u → v`, before geometry is consulted.
///
/// Crossing from sensed to unsensed space needs an exit event on the sensed
/// side; crossing into sensed space needs an entry event on the sensed side.
/// Sensed components never connect to each other directly.
pub fn may_connect(u: &SpatialEntity, v: &SpatialEntity) -> bool {
    if !u.accessible || !v.accessible {
        return false;
    }
    match (u.is_sensing(), v.is_sensing()) {
        (true, true) => false,
        (true, false) => u.track_exited(),
        (false, true) => v.track_entered(),
        (false, false) => true,
    }
}

/// Out-edge lists over `nodes`, by position.
pub fn connect(nodes: &[SpatialEntity]) -> Vec<Vec<usize>> {
    let mut edges = vec![Vec::new(); nodes.len()];
    for (i, u) in nodes.iter().enumerate() {
        for (j, v) in nodes.iter().enumerate() {
            if i == j || !may_connect(u, v) {
                continue;
            }
            if geometry::is_adjacent(&u.interior, &v.interior) {
                edges[i].push(j);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
    }

    fn sensor(tracklets: Vec<Tracklet>) -> SpatialEntity {
        SpatialEntity::sensing_region(NodeId::new("sensors", "cam"), square(0.0, 0.0, 5.0, 5.0), tracklets)
    }

    #[test]
    fn test_check_roles() {
        let map = SpatialEntity::static_region(NodeId::new("map", "a"), square(0.0, 0.0, 1.0, 1.0));
        let cam = sensor(Vec::new());
        assert!(check_roles(std::slice::from_ref(&map), std::slice::from_ref(&cam)).is_ok());
        assert!(matches!(
            check_roles(&[map.clone(), cam.clone()], &[]),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(check_roles(&[], &[map]), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_extract_tracklets() {
        let inside = Tracklet::new("in", 1.0, 1.0, 0);
        let outside = Tracklet::new("out", 20.0, 20.0, 0);
        let left_nearby = Tracklet::new("near", 8.0, 1.0, 0).exiting();
        let left_far = Tracklet::new("far", 30.0, 1.0, 0).exiting();
        let cam = sensor(vec![inside, outside, left_nearby, left_far]);
        let component = geometry::rect(0.0, 0.0, 5.0, 5.0).0.remove(0);

        let ids: Vec<_> = extract_tracklets(&cam, &component, 5.0).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["in".to_string(), "near".to_string()]);
    }

    #[test]
    fn test_may_connect_rules() {
        let shadow = SpatialEntity::static_region(NodeId::new("map", "a"), square(5.0, 0.0, 10.0, 5.0));
        let quiet = sensor(Vec::new());
        let entering = sensor(vec![Tracklet::new("t", 1.0, 1.0, 0).entering()]);
        let exiting = sensor(vec![Tracklet::new("t", 1.0, 1.0, 0).exiting()]);

        assert!(may_connect(&shadow, &shadow.clone()));
        assert!(!may_connect(&shadow, &quiet));
        assert!(may_connect(&shadow, &entering));
        assert!(!may_connect(&entering, &shadow));
        assert!(may_connect(&exiting, &shadow));
        assert!(!may_connect(&entering, &exiting));

        let blocked = shadow.clone().with_accessible(false);
        assert!(!may_connect(&blocked, &shadow));
    }

    #[test]
    fn test_partition_overlapping_sensors_first_claims() {
        let map = vec![SpatialEntity::static_region(NodeId::new("map", "room"), square(0.0, 0.0, 10.0, 10.0))];
        let left = SpatialEntity::sensing_region(NodeId::new("sensors", "left"), square(0.0, 0.0, 6.0, 6.0), Vec::new());
        let right = SpatialEntity::sensing_region(NodeId::new("sensors", "right"), square(4.0, 4.0, 10.0, 10.0), Vec::new());
        let out = partition(&map, &[left, right], 0, None, 5.0);

        let area_of = |polygon_id: &str| -> f64 {
            out.anti_shadows
                .iter()
                .filter(|a| a.id.polygon_id == polygon_id)
                .map(|a| geometry::area(&a.interior))
                .sum()
        };
        assert!((area_of("left") - 36.0).abs() < 1e-6);
        assert!((area_of("right") - 32.0).abs() < 1e-6);
        let overlap = geometry::area(&geometry::intersection(
            &out.anti_shadows[0].interior,
            &out.anti_shadows[1].interior,
        ));
        assert!(overlap < 1e-6);
        let shadow_area: f64 = out.shadows.iter().map(|s| geometry::area(&s.interior)).sum();
        assert!((shadow_area - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_partition_without_sensors_keeps_interiors() {
        let map = vec![
            SpatialEntity::static_region(NodeId::new("map", "a"), square(0.0, 0.0, 4.0, 4.0)),
            SpatialEntity::static_region(NodeId::new("map", "b"), square(4.0, 0.0, 8.0, 4.0)),
        ];
        let out = partition(&map, &[], 9, Some(1), 5.0);
        assert!(out.anti_shadows.is_empty());
        assert_eq!(out.shadows.len(), 2);
        for (shadow, region) in out.shadows.iter().zip(&map) {
            assert_eq!(shadow.interior, region.interior);
            assert_eq!(shadow.id.source_key(), region.id.source_key());
            assert_eq!(shadow.id.time_nano_secs, 9);
            assert_eq!(shadow.id.h_index, Some(1));
            assert!(!shadow.id.sub_part_id.is_empty());
        }
    }
}
