//! Geometry kernel.
//!
//! Thin layer over `geo` that fixes the conventions the connectivity graph
//! relies on: what counts as a component, what counts as adjacency, and the
//! tolerances used for both. Everything here is a pure function.

use geo::{Area, BooleanOps, EuclideanDistance, Intersects};
use geo_types::{Coord, Line, MultiPolygon, Point, Polygon};

/// Components with an area at or below this are discarded as slivers.
pub const AREA_EPSILON: f64 = 1e-9;

/// Perpendicular distance under which two boundary segments count as collinear.
pub const COLLINEAR_TOLERANCE: f64 = 1e-7;

pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    a.intersection(b)
}

pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    a.difference(b)
}

pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    a.union(b)
}

/// Union of any number of geometries.
pub fn union_all<'a>(parts: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> MultiPolygon<f64> {
    parts
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, part| union(&acc, part))
}

pub fn area(geom: &MultiPolygon<f64>) -> f64 {
    geom.unsigned_area()
}

/// Split a geometry into its simple polygon components, dropping slivers.
pub fn components(geom: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    geom.into_iter()
        .filter(|p| p.unsigned_area() > AREA_EPSILON)
        .collect()
}

/// Distance from a point to a polygon; zero when the point lies inside.
pub fn distance_to(poly: &Polygon<f64>, point: &Point<f64>) -> f64 {
    point.euclidean_distance(poly)
}

pub fn contains_point(poly: &Polygon<f64>, point: &Point<f64>) -> bool {
    poly.intersects(point)
}

/// Interiors overlap, touch, or run along a common boundary segment.
pub fn is_adjacent(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.intersects(b) || has_common_edge(a, b)
}

/// Whether any boundary segment of `a` overlaps a boundary segment of `b`
/// over a positive length.
pub fn has_common_edge(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.iter().any(|pa| {
        b.iter().any(|pb| {
            boundary_segments(pa).any(|sa| {
                boundary_segments(pb).any(|sb| shared_length(sa, sb) > COLLINEAR_TOLERANCE)
            })
        })
    })
}

fn boundary_segments(poly: &Polygon<f64>) -> impl Iterator<Item = Line<f64>> + '_ {
    poly.exterior()
        .lines()
        .chain(poly.interiors().iter().flat_map(|ring| ring.lines()))
}

/// Length over which two collinear segments overlap; zero when they are not
/// collinear.
fn shared_length(a: Line<f64>, b: Line<f64>) -> f64 {
    let d = a.delta();
    let len = d.x.hypot(d.y);
    if len <= COLLINEAR_TOLERANCE {
        return 0.0;
    }
    let offset = |p: Coord<f64>| (d.x * (p.y - a.start.y) - d.y * (p.x - a.start.x)) / len;
    if offset(b.start).abs() > COLLINEAR_TOLERANCE || offset(b.end).abs() > COLLINEAR_TOLERANCE {
        return 0.0;
    }
    let along = |p: Coord<f64>| (d.x * (p.x - a.start.x) + d.y * (p.y - a.start.y)) / len;
    let (t0, t1) = {
        let (s, e) = (along(b.start), along(b.end));
        if s <= e { (s, e) } else { (e, s) }
    };
    (t1.min(len) - t0.max(0.0)).max(0.0)
}

/// Axis-aligned rectangle as a single-component geometry.
pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![geo_types::Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    )
    .to_polygon()])
}
