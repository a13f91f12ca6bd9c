//! Run configuration.
//!
//! Defaults reproduce the Sant Cugat deployment: one depot and four zones
//! declared in priority order, each with its nominal route line.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::geocode::{API_KEY_ENV, GeocoderConfig};
use crate::model::Coordinate;
use crate::normalize::NormalizerConfig;
use crate::polyline::Polyline;
use crate::resolver::ResolverOptions;
use crate::solver::TourOptions;
use crate::zones::{DEFAULT_FALLBACK_ZONE, Zone};

/// Route ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Shortest open path from the depot.
    Tour,
    /// Follow each zone's nominal route line.
    #[default]
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub coordinate: Coordinate,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub depot: Depot,
    /// Zones in priority order. The first containing polygon wins.
    pub zones: Vec<Zone>,
    pub fallback_zone: String,
    /// Rows whose filter column equals this marker (case-insensitive) are skipped.
    pub exclusion_marker: Option<String>,
    pub cache_path: PathBuf,
    pub strategy: Strategy,
    pub geocoder: GeocoderConfig,
    pub resolver: ResolverOptions,
    pub tour: TourOptions,
    pub normalizer: NormalizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depot: Depot {
                coordinate: Coordinate::new(41.47855, 2.07228),
                address: "CARRER DE SOLSONA 22, SANT CUGAT DEL VALLES 08173".to_string(),
            },
            zones: default_zones(),
            fallback_zone: DEFAULT_FALLBACK_ZONE.to_string(),
            exclusion_marker: None,
            cache_path: PathBuf::from("geocoding_cache.json"),
            strategy: Strategy::default(),
            geocoder: GeocoderConfig::default(),
            resolver: ResolverOptions::default(),
            tour: TourOptions::default(),
            normalizer: NormalizerConfig {
                locality: Some("SANT CUGAT DEL VALLES".to_string()),
                locality_overrides: vec!["VALLDOREIX".to_string()],
            },
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Takes the provider API key from the environment when it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.geocoder.api_key = key;
            }
        }
        self
    }

    /// Rejects configurations that cannot classify or order points.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.depot.coordinate.is_finite() {
            return Err(ConfigError::NonFiniteCoordinate("depot".to_string()));
        }
        let mut names = HashSet::new();
        for zone in &self.zones {
            if zone.polygon.len() < 3 {
                return Err(ConfigError::DegeneratePolygon(zone.name.clone()));
            }
            let route_points = zone.route.as_ref().map(Polyline::points).unwrap_or_default();
            if !zone.polygon.iter().chain(route_points).all(Coordinate::is_finite) {
                return Err(ConfigError::NonFiniteCoordinate(format!("zone {}", zone.name)));
            }
            if !names.insert(zone.name.as_str()) || zone.name == self.fallback_zone {
                return Err(ConfigError::DuplicateZone(zone.name.clone()));
            }
            if let Some(first) = zone.route.as_ref().and_then(|route| route.points().first()) {
                if *first != self.depot.coordinate {
                    warn!(zone = %zone.name, "route line does not start at the depot");
                }
            }
        }
        if self.resolver.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

fn ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
    points.iter().copied().map(Coordinate::from).collect()
}

fn default_zones() -> Vec<Zone> {
    vec![
        Zone::new(
            "Indust",
            ring(&[
                (41.47965, 2.07387),
                (41.49077, 2.07591),
                (41.49193, 2.08694),
                (41.47682, 2.10226),
                (41.47181, 2.09789),
                (41.47386, 2.09179),
                (41.47603, 2.0909),
                (41.47589, 2.08279),
            ]),
        )
        .with_route(Polyline::from(vec![
            (41.47855, 2.07228),
            (41.47984, 2.07411),
            (41.4769, 2.08276),
            (41.47755, 2.08434),
            (41.48003, 2.08117),
            (41.48145, 2.08552),
            (41.48341, 2.08415),
            (41.485, 2.08743),
            (41.48167, 2.09179),
            (41.47942, 2.09157),
            (41.47696, 2.09584),
            (41.47596, 2.09546),
            (41.47575, 2.09775),
            (41.4737, 2.09726),
            (41.47402, 2.09166),
            (41.47632, 2.09048),
            (41.47707, 2.08803),
        ])),
        Zone::new(
            "Centre",
            ring(&[
                (41.47965, 2.07387),
                (41.47589, 2.08279),
                (41.47603, 2.0909),
                (41.47386, 2.09179),
                (41.47181, 2.09789),
                (41.45823, 2.08887),
                (41.46548, 2.07734),
                (41.46705, 2.07794),
                (41.46837, 2.07834),
                (41.47356, 2.07736),
            ]),
        )
        .with_route(Polyline::from(vec![
            (41.47855, 2.07228),
            (41.47000, 2.08500),
            (41.46000, 2.08500),
        ])),
        Zone::new(
            "MiraEst",
            ring(&[
                (41.47965, 2.07387),
                (41.47356, 2.07736),
                (41.46837, 2.07834),
                (41.46705, 2.07794),
                (41.464, 2.07437),
                (41.45739, 2.08844),
                (41.45, 2.08671),
                (41.45296, 2.06534),
                (41.45903, 2.0647),
                (41.47744, 2.06418),
                (41.47699, 2.04356),
                (41.50087, 2.05476),
                (41.50133, 2.07809),
                (41.49077, 2.07591),
            ]),
        )
        .with_route(Polyline::from(vec![
            (41.47855, 2.07228),
            (41.47000, 2.06500),
            (41.45500, 2.07000),
        ])),
        Zone::new(
            "Mira",
            ring(&[
                (41.47699, 2.04356),
                (41.47744, 2.06418),
                (41.45903, 2.0647),
                (41.45296, 2.06534),
                (41.45264, 2.0254),
                (41.47495, 2.02771),
            ]),
        )
        .with_route(Polyline::from(vec![
            (41.47855, 2.07228),
            (41.46500, 2.05000),
            (41.45500, 2.03500),
        ])),
    ]
}
