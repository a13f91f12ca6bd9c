//! Seams to external collaborators.
//!
//! The geocoding provider, the address normalizer and the tour solver can
//! all be swapped for fakes in tests.

use crate::error::GeocodeError;
use crate::model::{Coordinate, DeliveryPoint};
use crate::zones::Zone;

/// Resolves one normalized address to a coordinate.
///
/// `Ok(None)` means the provider answered "no match". `Err` means the call
/// itself failed (transport, HTTP status, unexpected provider status).
pub trait Geocoder: Sync {
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Turns raw address text into the normalized lookup key.
pub trait AddressNormalizer {
    fn normalize(&self, raw: &str) -> String;
}

/// Provides a distance matrix for a set of coordinates.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<i32>>;
}

/// Produces an open Hamiltonian path over a distance matrix.
///
/// The returned order must start at `start` and visit every index exactly
/// once. No return to the start is implied.
pub trait TourSolver {
    fn solve(&self, matrix: &[Vec<i32>], start: usize) -> Vec<usize>;
}

/// Orders the delivery points of one zone into a visiting sequence.
pub trait RouteStrategy {
    fn name(&self) -> &'static str;

    fn order(&self, zone: Option<&Zone>, points: Vec<DeliveryPoint>) -> Vec<DeliveryPoint>;
}
