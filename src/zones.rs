//! Geographic zones and point classification.
//!
//! Zones are checked in declaration order and the first polygon containing
//! a point wins. Overlaps are therefore resolved by the order zones are
//! declared in, not by best fit.

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, DeliveryPoint, ZoneName};
use crate::polyline::Polyline;

/// Zone name used when no polygon contains a point.
pub const DEFAULT_FALLBACK_ZONE: &str = "sin_zona";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: ZoneName,
    /// Polygon ring, implicitly closed.
    pub polygon: Vec<Coordinate>,
    /// Nominal route with the depot as its first waypoint.
    #[serde(default)]
    pub route: Option<Polyline>,
}

impl Zone {
    /// Creates a zone without a route line.
    pub fn new(name: impl Into<ZoneName>, polygon: Vec<Coordinate>) -> Self {
        Self {
            name: name.into(),
            polygon,
            route: None,
        }
    }

    /// Sets the nominal route line.
    pub fn with_route(mut self, route: Polyline) -> Self {
        self.route = Some(route);
        self
    }

    /// Whether `coordinate` lies inside the polygon.
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        is_inside(coordinate, &self.polygon)
    }
}

/// Ray casting containment test. Latitude is treated as x, longitude as y.
fn is_inside(coordinate: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let (x, y) = (coordinate.lat, coordinate.lng);

    let mut inside = false;
    let mut j = ring.len() - 1;
    for (i, vertex) in ring.iter().enumerate() {
        let (ix, iy) = (vertex.lat, vertex.lng);
        let (jx, jy) = (ring[j].lat, ring[j].lng);

        if ((ix > x) != (jx > x)) && (y < (jy - iy) * (x - ix) / (jx - ix) + iy) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Points of one zone, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGroup {
    pub name: ZoneName,
    pub points: Vec<DeliveryPoint>,
}

/// Classification result: one group per declared zone, then the fallback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneGroups {
    groups: Vec<ZoneGroup>,
}

impl ZoneGroups {
    pub fn groups(&self) -> &[ZoneGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<ZoneGroup> {
        self.groups
    }

    /// Points assigned to `name`.
    pub fn get(&self, name: &str) -> Option<&[DeliveryPoint]> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .map(|group| group.points.as_slice())
    }

    /// Per-zone point counts, in group order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|group| (group.name.as_str(), group.points.len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.points.len()).sum()
    }
}

/// Assigns points to the first declared zone that contains them.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    zones: Vec<Zone>,
    fallback: ZoneName,
}

impl ZoneClassifier {
    /// Classifier with the default fallback zone name.
    pub fn new(zones: Vec<Zone>) -> Self {
        Self::with_fallback(zones, DEFAULT_FALLBACK_ZONE)
    }

    pub fn with_fallback(zones: Vec<Zone>, fallback: impl Into<ZoneName>) -> Self {
        Self {
            zones,
            fallback: fallback.into(),
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Name given to points outside every zone.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Name of the first zone containing `coordinate`, or the fallback.
    pub fn classify(&self, coordinate: &Coordinate) -> &str {
        self.zones
            .iter()
            .find(|zone| zone.contains(coordinate))
            .map_or(self.fallback.as_str(), |zone| zone.name.as_str())
    }

    /// Tags every point with its zone and groups them.
    pub fn classify_all(&self, points: Vec<DeliveryPoint>) -> ZoneGroups {
        let mut groups: Vec<ZoneGroup> = self
            .zones
            .iter()
            .map(|zone| zone.name.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
            .map(|name| ZoneGroup {
                name: name.to_string(),
                points: Vec::new(),
            })
            .collect();

        for mut point in points {
            let index = self
                .zones
                .iter()
                .position(|zone| zone.contains(&point.coordinate))
                .unwrap_or(self.zones.len());
            point.zone = Some(groups[index].name.clone());
            groups[index].points.push(point);
        }

        ZoneGroups { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(min, min),
            Coordinate::new(max, min),
            Coordinate::new(max, max),
            Coordinate::new(min, max),
        ]
    }

    #[test]
    fn test_point_in_square() {
        let zone = Zone::new("a", square(0.0, 10.0));
        assert!(zone.contains(&Coordinate::new(5.0, 5.0)));
        assert!(!zone.contains(&Coordinate::new(15.0, 5.0)));
        assert!(!zone.contains(&Coordinate::new(-1.0, -1.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening towards high latitude.
        let polygon = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 0.0),
            Coordinate::new(10.0, 3.0),
            Coordinate::new(2.0, 3.0),
            Coordinate::new(2.0, 7.0),
            Coordinate::new(10.0, 7.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(0.0, 10.0),
        ];
        let zone = Zone::new("u", polygon);
        assert!(zone.contains(&Coordinate::new(5.0, 1.0)));
        assert!(zone.contains(&Coordinate::new(1.0, 5.0)));
        assert!(!zone.contains(&Coordinate::new(5.0, 5.0)));
    }

    #[test]
    fn test_degenerate_ring_contains_nothing() {
        let zone = Zone::new("line", vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]);
        assert!(!zone.contains(&Coordinate::new(0.5, 0.5)));
    }

    #[test]
    fn test_fallback_when_no_zone_matches() {
        let classifier = ZoneClassifier::new(vec![Zone::new("a", square(0.0, 1.0))]);
        assert_eq!(classifier.classify(&Coordinate::new(50.0, 50.0)), DEFAULT_FALLBACK_ZONE);
        assert_eq!(classifier.fallback(), DEFAULT_FALLBACK_ZONE);
    }

    #[test]
    fn test_overlap_resolved_by_declaration_order() {
        let big = Zone::new("big", square(0.0, 10.0));
        let small = Zone::new("small", square(4.0, 6.0));
        let inside_both = Coordinate::new(5.0, 5.0);

        let big_first = ZoneClassifier::new(vec![big.clone(), small.clone()]);
        assert_eq!(big_first.classify(&inside_both), "big");

        let small_first = ZoneClassifier::new(vec![small, big]);
        assert_eq!(small_first.classify(&inside_both), "small");

        // Outside the overlap, order does not matter.
        assert_eq!(small_first.classify(&Coordinate::new(1.0, 1.0)), "big");
    }

    #[test]
    fn test_classify_all_groups_in_order() {
        let classifier = ZoneClassifier::with_fallback(
            vec![Zone::new("a", square(0.0, 1.0)), Zone::new("b", square(2.0, 3.0))],
            "none",
        );
        let points = vec![
            DeliveryPoint::new(Coordinate::new(2.5, 2.5), "b1"),
            DeliveryPoint::new(Coordinate::new(0.5, 0.5), "a1"),
            DeliveryPoint::new(Coordinate::new(9.0, 9.0), "x1"),
            DeliveryPoint::new(Coordinate::new(2.2, 2.7), "b2"),
        ];

        let groups = classifier.classify_all(points);
        let names: Vec<&str> = groups.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "none"]);

        let b: Vec<&str> = groups.get("b").unwrap().iter().map(|p| p.address.as_str()).collect();
        assert_eq!(b, vec!["b1", "b2"]);
        assert_eq!(groups.get("none").unwrap()[0].zone.as_deref(), Some("none"));
        assert_eq!(groups.counts(), vec![("a", 1), ("b", 2), ("none", 1)]);
        assert_eq!(groups.total(), 4);
    }
}
