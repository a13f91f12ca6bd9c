//! Per-zone route ordering.

use tracing::info;

use crate::model::OrderedRoute;
use crate::traits::RouteStrategy;
use crate::zones::{Zone, ZoneGroups};

/// Orders every zone group independently with `strategy`.
///
/// Zones are looked up in `zones` by name. Groups with no matching zone
/// (such as the fallback group) are handed to the strategy without one.
pub fn order_zones(groups: ZoneGroups, zones: &[Zone], strategy: &dyn RouteStrategy) -> Vec<OrderedRoute> {
    groups
        .into_groups()
        .into_iter()
        .map(|group| {
            let zone = zones.iter().find(|zone| zone.name == group.name);
            let count = group.points.len();
            let stops = if count == 0 {
                group.points
            } else {
                info!(zone = %group.name, points = count, strategy = strategy.name(), "ordering zone");
                strategy.order(zone, group.points)
            };
            debug_assert_eq!(stops.len(), count);
            OrderedRoute {
                zone: group.name,
                stops,
            }
        })
        .collect()
}
