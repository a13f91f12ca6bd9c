//! Distance matrix providers for the tour strategy.
//!
//! The default metric is planar distance in coordinate degrees, scaled into
//! integer units. Haversine yields whole metres.

use serde::{Deserialize, Serialize};

use crate::model::Coordinate;
use crate::traits::DistanceMatrixProvider;

/// Scale applied to planar degree distances before rounding.
const DEGREE_SCALE: f64 = 100_000.0;

/// Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Which distance metric the tour strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Haversine,
}

impl Metric {
    pub fn provider(self) -> Box<dyn DistanceMatrixProvider> {
        match self {
            Metric::Euclidean => Box::new(EuclideanMatrix),
            Metric::Haversine => Box::new(HaversineMatrix),
        }
    }
}

/// Straight-line distance in degrees, times 100000, truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanMatrix;

impl EuclideanMatrix {
    fn distance(from: &Coordinate, to: &Coordinate) -> i32 {
        ((from.lat - to.lat).hypot(from.lng - to.lng) * DEGREE_SCALE) as i32
    }
}

impl DistanceMatrixProvider for EuclideanMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<i32>> {
        build_matrix(locations, Self::distance)
    }
}

/// Great-circle distance in whole metres.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl HaversineMatrix {
    fn haversine_m(from: &Coordinate, to: &Coordinate) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinate]) -> Vec<Vec<i32>> {
        build_matrix(locations, |from, to| Self::haversine_m(from, to).round() as i32)
    }
}

fn build_matrix(locations: &[Coordinate], distance: impl Fn(&Coordinate, &Coordinate) -> i32) -> Vec<Vec<i32>> {
    let n = locations.len();
    let mut matrix = vec![vec![0; n]; n];

    for (i, from) in locations.iter().enumerate() {
        for (j, to) in locations.iter().enumerate() {
            if i != j {
                matrix[i][j] = distance(from, to);
            }
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let p = Coordinate::new(41.47855, 2.07228);
        assert!(HaversineMatrix::haversine_m(&p, &p) < 0.001);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Sant Cugat depot to Barcelona Plaça de Catalunya, roughly 13 km.
        let depot = Coordinate::new(41.47855, 2.07228);
        let bcn = Coordinate::new(41.38706, 2.17010);
        let dist = HaversineMatrix::haversine_m(&depot, &bcn);
        assert!(dist > 11_000.0 && dist < 14_000.0, "expected ~13km, got {}", dist);
    }

    #[test]
    fn test_euclidean_scaling() {
        let matrix = EuclideanMatrix.matrix_for(&[Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.5)]);
        assert_eq!(matrix[0][1], 50_000);
        assert_eq!(matrix[1][0], 50_000);
    }

    #[test]
    fn test_matrix_diagonal_is_zero() {
        let locations = vec![
            Coordinate::new(41.47, 2.07),
            Coordinate::new(41.48, 2.08),
            Coordinate::new(41.49, 2.09),
        ];
        for provider in [Metric::Euclidean.provider(), Metric::Haversine.provider()] {
            let matrix = provider.matrix_for(&locations);
            for i in 0..locations.len() {
                assert_eq!(matrix[i][i], 0, "Diagonal should be zero");
            }
        }
    }

    #[test]
    fn test_metric_parses_lowercase() {
        let metric: Metric = serde_json::from_str("\"haversine\"").unwrap();
        assert_eq!(metric, Metric::Haversine);
        assert_eq!(Metric::default(), Metric::Euclidean);
    }
}
