//! One planning run: rows in, per-zone ordered stops out.
//!
//! resolve → classify → order → emit. The depot never goes through the
//! classifier; only the tour strategy sees it, as its fixed start.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::GeocodeCache;
use crate::config::{Config, Strategy};
use crate::error::PipelineError;
use crate::model::{Address, DeliveryRow, OrderedRoute, ParcelRef, UnresolvedAddress};
use crate::ordering::order_zones;
use crate::projection::LineProjection;
use crate::resolver::{GeocodeResolver, ResolutionStats};
use crate::solver::TourOrdering;
use crate::traits::{AddressNormalizer, Geocoder, RouteStrategy};
use crate::zones::ZoneClassifier;

/// One stop as handed to the output boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStop {
    pub address: String,
    /// Comma-joined parcel refs.
    pub parcel_refs: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Ordered stops for one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneRoute {
    pub zone: String,
    pub stops: Vec<PlannedStop>,
}

impl From<OrderedRoute> for ZoneRoute {
    fn from(route: OrderedRoute) -> Self {
        Self {
            zone: route.zone,
            stops: route
                .stops
                .into_iter()
                .map(|point| PlannedStop {
                    parcel_refs: point.joined_parcel_refs(),
                    address: point.address,
                    latitude: point.coordinate.lat,
                    longitude: point.coordinate.lng,
                })
                .collect(),
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub strategy: Strategy,
    pub routes: Vec<ZoneRoute>,
    pub unresolved: Vec<UnresolvedAddress>,
}

impl RoutePlan {
    /// The route for `zone`, if it exists.
    pub fn route(&self, zone: &str) -> Option<&ZoneRoute> {
        self.routes.iter().find(|route| route.zone == zone)
    }

    /// Stops across all zones.
    pub fn stop_count(&self) -> usize {
        self.routes.iter().map(|route| route.stops.len()).sum()
    }
}

/// Wires the cache, geocoder, normalizer and zone classifier into one run.
pub struct Pipeline<'a, G: Geocoder, N: AddressNormalizer> {
    config: &'a Config,
    cache: &'a GeocodeCache,
    geocoder: &'a G,
    normalizer: &'a N,
    classifier: ZoneClassifier,
}

impl<'a, G: Geocoder, N: AddressNormalizer> Pipeline<'a, G, N> {
    /// Builds the zone classifier from `config`.
    pub fn new(config: &'a Config, cache: &'a GeocodeCache, geocoder: &'a G, normalizer: &'a N) -> Self {
        let classifier = ZoneClassifier::with_fallback(config.zones.clone(), config.fallback_zone.clone());
        Self {
            config,
            cache,
            geocoder,
            normalizer,
            classifier,
        }
    }

    /// Runs with the strategy named in the configuration.
    pub fn run(&self, rows: &[DeliveryRow]) -> Result<RoutePlan, PipelineError> {
        self.run_with(rows, self.config.strategy)
    }

    /// Runs with the built-in implementation of `strategy`.
    pub fn run_with(&self, rows: &[DeliveryRow], strategy: Strategy) -> Result<RoutePlan, PipelineError> {
        let ordering: Box<dyn RouteStrategy> = match strategy {
            Strategy::Tour => {
                info!(depot = %self.config.depot.address, "tours start at the depot");
                Box::new(TourOrdering::greedy(&self.config.tour, self.config.depot.coordinate))
            }
            Strategy::Line => Box::new(LineProjection),
        };
        let (routes, unresolved) = self.plan(rows, ordering.as_ref())?;
        Ok(RoutePlan {
            strategy,
            routes: routes.into_iter().map(ZoneRoute::from).collect(),
            unresolved,
        })
    }

    /// Runs with a caller-supplied ordering strategy, such as an external
    /// tour solver wrapped in [`TourOrdering`].
    pub fn plan(
        &self,
        rows: &[DeliveryRow],
        strategy: &dyn RouteStrategy,
    ) -> Result<(Vec<OrderedRoute>, Vec<UnresolvedAddress>), PipelineError> {
        let (addresses, parcel_refs) = self.prepare(rows);
        info!(rows = rows.len(), addresses = addresses.len(), "prepared delivery rows");

        let resolver = GeocodeResolver::new(self.geocoder, self.cache, self.config.resolver.clone());
        let resolution = resolver.resolve(&addresses, &parcel_refs)?;
        log_resolution(&resolution.stats, resolution.points.len());

        if resolution.points.is_empty() {
            return Err(PipelineError::NoDeliveryPoints {
                unresolved: resolution.unresolved.len(),
            });
        }

        let groups = self.classifier.classify_all(resolution.points);
        for (zone, count) in groups.counts() {
            info!(zone, count, "zone assignment");
        }
        info!(total = groups.total(), "points classified");
        let fallback = self.classifier.fallback();
        if let Some(unassigned) = groups.get(fallback).filter(|points| !points.is_empty()) {
            warn!(zone = fallback, count = unassigned.len(), "points fall outside every zone");
        }

        let routes = order_zones(groups, self.classifier.zones(), strategy);
        Ok((routes, resolution.unresolved))
    }

    /// Applies the input-boundary filters and normalizes addresses.
    ///
    /// Returns the address of every kept row in row order (repeats included)
    /// and the parcel refs collected per normalized address.
    fn prepare(&self, rows: &[DeliveryRow]) -> (Vec<Address>, HashMap<Address, Vec<ParcelRef>>) {
        let marker = self.config.exclusion_marker.as_deref().map(str::trim);
        let mut addresses = Vec::with_capacity(rows.len());
        let mut parcel_refs: HashMap<Address, Vec<ParcelRef>> = HashMap::new();
        let mut excluded = 0usize;
        let mut empty = 0usize;

        for row in rows {
            let is_excluded = match (marker, row.filter.as_deref()) {
                (Some(marker), Some(filter)) => filter.trim().eq_ignore_ascii_case(marker),
                _ => false,
            };
            if is_excluded {
                excluded += 1;
                continue;
            }
            if row.address.trim().is_empty() {
                empty += 1;
                continue;
            }

            let address = self.normalizer.normalize(&row.address);
            if address.is_empty() {
                empty += 1;
                continue;
            }
            let refs = parcel_refs.entry(address.clone()).or_default();
            if !row.parcel_ref.is_empty() && !refs.contains(&row.parcel_ref) {
                refs.push(row.parcel_ref.clone());
            }
            addresses.push(address);
        }

        if excluded > 0 || empty > 0 {
            warn!(excluded, empty, "rows dropped before geocoding");
        }
        (addresses, parcel_refs)
    }
}

fn log_resolution(stats: &ResolutionStats, points: usize) {
    info!(
        unique = stats.unique_addresses,
        cache_hits = stats.cache_hits,
        cache_misses = stats.cache_misses,
        merged = stats.merged_duplicates,
        points,
        "addresses resolved"
    );
}
