//! Polyline representation for nominal zone routes.
//!
//! A zone's route line is an ordered sequence of waypoints whose first
//! element is the depot. Lengths are planar, in coordinate degrees.

use serde::{Deserialize, Serialize};

use crate::model::Coordinate;

/// A route shape as an ordered list of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

/// One straight piece of a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl Segment {
    /// Planar length in coordinate degrees.
    pub fn length(&self) -> f64 {
        (self.end.lat - self.start.lat).hypot(self.end.lng - self.start.lng)
    }
}

impl Polyline {
    /// Creates a polyline from waypoints in route order.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Returns the waypoints.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns its waypoints.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    /// Consecutive waypoint pairs, in route order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|pair| Segment {
            start: pair[0],
            end: pair[1],
        })
    }

    /// Total planar length, in coordinate degrees.
    pub fn length(&self) -> f64 {
        self.segments().map(|segment| segment.length()).sum()
    }

    /// True when the line cannot order anything: fewer than two waypoints,
    /// zero length, or a non-finite waypoint.
    pub fn is_degenerate(&self) -> bool {
        let length = self.length();
        self.points.len() < 2 || length == 0.0 || !length.is_finite()
    }
}

impl From<Vec<(f64, f64)>> for Polyline {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(Coordinate::from).collect())
    }
}
