//! Ordering by projection onto a zone's nominal route line.
//!
//! Each delivery point is projected onto the nearest segment of the route
//! polyline. Its position along the route (normalized to `[0, 1]`) decides
//! the visiting order.

use tracing::{debug, warn};

use crate::model::{Coordinate, DeliveryPoint};
use crate::polyline::{Polyline, Segment};
use crate::traits::RouteStrategy;
use crate::zones::Zone;

/// Where a point lands on a route line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePosition {
    /// Normalized distance along the route, in `[0, 1]`.
    pub position: f64,
    /// Perpendicular distance to the nearest segment.
    pub distance: f64,
}

/// Closest point on `segment` to `point`: returns (distance, offset from the
/// segment start). The offset is clamped to `[0, segment length]`.
fn project_onto_segment(point: &Coordinate, segment: &Segment) -> (f64, f64) {
    let (dx, dy) = (segment.end.lat - segment.start.lat, segment.end.lng - segment.start.lng);
    let (px, py) = (point.lat - segment.start.lat, point.lng - segment.start.lng);
    let length = dx.hypot(dy);

    if length == 0.0 {
        return (px.hypot(py), 0.0);
    }

    let (ux, uy) = (dx / length, dy / length);
    let offset = (px * ux + py * uy).max(0.0).min(length);
    let (cx, cy) = (ux * offset, uy * offset);
    ((px - cx).hypot(py - cy), offset)
}

/// Position of `point` along `route`.
///
/// The winning segment is the one with the strictly smallest perpendicular
/// distance, so the earliest segment wins ties. Returns `None` for
/// degenerate routes (see [`Polyline::is_degenerate`]).
pub fn route_position(point: &Coordinate, route: &Polyline) -> Option<RoutePosition> {
    if route.is_degenerate() {
        return None;
    }
    let total = route.length();

    let mut best_distance = f64::INFINITY;
    let mut best_position = 0.0;
    let mut walked = 0.0;
    for segment in route.segments() {
        let (distance, offset) = project_onto_segment(point, &segment);
        if distance < best_distance {
            best_distance = distance;
            best_position = walked + offset;
        }
        walked += segment.length();
    }

    Some(RoutePosition {
        position: best_position / total,
        distance: best_distance,
    })
}

/// Orders points by their position along `route`.
///
/// Equal positions keep input order. Points whose position cannot be
/// computed as a finite number are appended at the end in input order.
/// A degenerate route leaves the input order unchanged.
pub fn order_along(route: &Polyline, points: Vec<DeliveryPoint>) -> Vec<DeliveryPoint> {
    if points.is_empty() {
        return points;
    }
    if route.is_degenerate() {
        warn!(
            waypoints = route.points().len(),
            length = route.length(),
            "route line is degenerate, keeping input order"
        );
        return points;
    }

    let mut placed: Vec<(f64, DeliveryPoint)> = Vec::with_capacity(points.len());
    let mut deferred: Vec<DeliveryPoint> = Vec::new();
    for point in points {
        match route_position(&point.coordinate, route) {
            Some(RoutePosition { position, distance }) if position.is_finite() && distance.is_finite() => {
                debug!(address = %point.address, position, distance, "projected onto route");
                placed.push((position, point));
            }
            other => {
                warn!(address = %point.address, result = ?other, "cannot project point, moving it to the end");
                deferred.push(point);
            }
        }
    }

    // Stable: ties keep input order.
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));

    if !deferred.is_empty() {
        warn!(count = deferred.len(), "points placed at the end of the route");
    }
    placed
        .into_iter()
        .map(|(_, point)| point)
        .chain(deferred)
        .collect()
}

/// Route strategy that follows each zone's nominal route line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineProjection;

impl RouteStrategy for LineProjection {
    fn name(&self) -> &'static str {
        "line"
    }

    fn order(&self, zone: Option<&Zone>, points: Vec<DeliveryPoint>) -> Vec<DeliveryPoint> {
        match zone.and_then(|zone| zone.route.as_ref()) {
            Some(route) => order_along(route, points),
            None => {
                if !points.is_empty() {
                    warn!(
                        zone = zone.map(|zone| zone.name.as_str()),
                        "no route line configured, keeping input order"
                    );
                }
                points
            }
        }
    }
}
