//! Batch address resolution.
//!
//! Cache hits are answered locally. Misses go to the provider on a bounded
//! worker pool, a sub-batch at a time. Results are merged by coordinate in
//! first-seen address order, so the outcome does not depend on which worker
//! finished first.

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{GeocodeCache, Lookup};
use crate::error::PipelineError;
use crate::model::{Address, Coordinate, DeliveryPoint, ParcelRef, UnresolvedAddress};
use crate::traits::Geocoder;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Concurrent provider calls, also the sub-batch size.
    pub workers: usize,
    /// Pause after each sub-batch of provider calls.
    pub pause_ms: u64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            pause_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionStats {
    pub unique_addresses: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Addresses folded into an existing point because of a shared coordinate.
    pub merged_duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub points: Vec<DeliveryPoint>,
    pub unresolved: Vec<UnresolvedAddress>,
    pub stats: ResolutionStats,
}

enum Outcome {
    Found(Coordinate),
    NotFound,
    Failed,
}

/// Turns normalized addresses into delivery points using the cache first
/// and the provider for misses.
pub struct GeocodeResolver<'a, G: Geocoder> {
    geocoder: &'a G,
    cache: &'a GeocodeCache,
    options: ResolverOptions,
}

impl<'a, G: Geocoder> GeocodeResolver<'a, G> {
    /// Creates a resolver over a shared cache.
    pub fn new(geocoder: &'a G, cache: &'a GeocodeCache, options: ResolverOptions) -> Self {
        Self {
            geocoder,
            cache,
            options,
        }
    }

    /// Resolves `addresses` into delivery points.
    ///
    /// Repeated addresses are looked up once. Parcel refs are taken from
    /// `parcel_refs` per unique address.
    pub fn resolve(
        &self,
        addresses: &[Address],
        parcel_refs: &HashMap<Address, Vec<ParcelRef>>,
    ) -> Result<Resolution, PipelineError> {
        let unique = dedupe(addresses);
        let mut stats = ResolutionStats {
            unique_addresses: unique.len(),
            ..ResolutionStats::default()
        };

        let mut outcomes: HashMap<&str, Outcome> = HashMap::with_capacity(unique.len());
        let mut misses: Vec<&str> = Vec::new();
        for &address in &unique {
            match self.cache.get(address) {
                Lookup::Resolved(coordinate) => {
                    outcomes.insert(address, Outcome::Found(coordinate));
                }
                Lookup::NotFound => {
                    outcomes.insert(address, Outcome::NotFound);
                }
                Lookup::Unknown => misses.push(address),
            }
        }
        stats.cache_hits = unique.len() - misses.len();
        stats.cache_misses = misses.len();
        info!(
            hits = stats.cache_hits,
            misses = stats.cache_misses,
            "geocode cache consulted"
        );

        if !misses.is_empty() {
            let fetched = self.geocode_misses(&misses)?;
            // Failed calls leave the cache untouched.
            let written = fetched
                .iter()
                .filter(|(_, outcome)| !matches!(outcome, Outcome::Failed))
                .count();
            outcomes.extend(fetched);
            if written > 0 {
                if let Err(err) = self.cache.flush() {
                    warn!(error = %err, "failed to persist geocode cache");
                }
            }
        }

        let mut points: Vec<DeliveryPoint> = Vec::new();
        let mut by_coordinate: HashMap<(u64, u64), usize> = HashMap::new();
        let mut unresolved = Vec::new();
        for &address in &unique {
            let refs = parcel_refs.get(address).map(Vec::as_slice).unwrap_or_default();
            match outcomes.get(address) {
                Some(Outcome::Found(coordinate)) => match by_coordinate.get(&coordinate.key()) {
                    Some(&index) => {
                        points[index].add_parcels(refs.iter().cloned());
                        stats.merged_duplicates += 1;
                        debug!(address, kept = %points[index].address, "merged duplicate coordinate");
                    }
                    None => {
                        by_coordinate.insert(coordinate.key(), points.len());
                        points.push(DeliveryPoint::new(*coordinate, address).with_parcels(refs.iter().cloned()));
                    }
                },
                _ => unresolved.push(UnresolvedAddress {
                    address: address.to_string(),
                    parcel_refs: refs.to_vec(),
                }),
            }
        }

        if stats.merged_duplicates > 0 {
            info!(merged = stats.merged_duplicates, "addresses shared a delivery point");
        }
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "addresses could not be resolved");
        }

        Ok(Resolution {
            points,
            unresolved,
            stats,
        })
    }

    /// Geocodes cache misses on a pool of `workers` threads.
    ///
    /// Every definitive answer is written to the cache as it arrives. Failed
    /// calls are not cached so they are retried on the next run.
    fn geocode_misses<'m>(&self, misses: &[&'m str]) -> Result<Vec<(&'m str, Outcome)>, PipelineError> {
        let workers = self.options.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("geocode-{}", index))
            .build()?;
        let pause = Duration::from_millis(self.options.pause_ms);
        let batches = misses.len().div_ceil(workers);

        let mut results = Vec::with_capacity(misses.len());
        for (batch_index, batch) in misses.chunks(workers).enumerate() {
            let outcomes: Vec<(&str, Outcome)> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|address| (*address, self.lookup(address)))
                    .collect()
            });
            results.extend(outcomes);

            if !pause.is_zero() && batch_index + 1 < batches {
                thread::sleep(pause);
            }
        }
        Ok(results)
    }

    fn lookup(&self, address: &str) -> Outcome {
        match self.geocoder.geocode(address) {
            Ok(Some(coordinate)) => {
                self.cache.put(address, Some(coordinate));
                Outcome::Found(coordinate)
            }
            Ok(None) => {
                self.cache.put(address, None);
                debug!(address, "provider found no match");
                Outcome::NotFound
            }
            Err(err) => {
                warn!(address, error = %err, "geocoding call failed");
                Outcome::Failed
            }
        }
    }
}

fn dedupe(addresses: &[Address]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(addresses.len());
    addresses
        .iter()
        .map(String::as_str)
        .filter(|address| seen.insert(*address))
        .collect()
}
