//! Domain types shared by the resolver, classifier and orderers.

use serde::{Deserialize, Serialize};

/// Normalized address text, used as the geocoding key.
pub type Address = String;

/// Opaque parcel identifier (usually a barcode).
pub type ParcelRef = String;

/// Zone name as declared in configuration.
pub type ZoneName = String;

/// A resolved (latitude, longitude) pair.
///
/// Equality is exact. Two addresses that resolve to the same coordinate are
/// the same delivery stop. Serializes as a two-element `[lat, lng]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Bit-exact key for hashing. `-0.0` is folded into `0.0`.
    pub fn key(&self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lng + 0.0).to_bits())
    }

    /// Both components are finite.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(coordinate: Coordinate) -> Self {
        (coordinate.lat, coordinate.lng)
    }
}

/// One input row handed over by the spreadsheet boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRow {
    pub parcel_ref: ParcelRef,
    pub address: String,
    #[serde(default)]
    pub filter: Option<String>,
}

impl DeliveryRow {
    pub fn new(parcel_ref: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            parcel_ref: parcel_ref.into(),
            address: address.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// A unique physical stop with its aggregated parcels.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryPoint {
    pub coordinate: Coordinate,
    /// First address seen for this coordinate.
    pub address: Address,
    parcel_refs: Vec<ParcelRef>,
    pub zone: Option<ZoneName>,
}

impl DeliveryPoint {
    /// A point with no parcels yet.
    pub fn new(coordinate: Coordinate, address: impl Into<Address>) -> Self {
        Self {
            coordinate,
            address: address.into(),
            parcel_refs: Vec::new(),
            zone: None,
        }
    }

    pub fn with_parcels<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ParcelRef>,
    {
        self.add_parcels(refs);
        self
    }

    /// Adds a parcel ref unless it is already present. Returns whether it was added.
    pub fn add_parcel(&mut self, parcel_ref: impl Into<ParcelRef>) -> bool {
        let parcel_ref = parcel_ref.into();
        if self.parcel_refs.contains(&parcel_ref) {
            return false;
        }
        self.parcel_refs.push(parcel_ref);
        true
    }

    pub fn add_parcels<I, S>(&mut self, refs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ParcelRef>,
    {
        for parcel_ref in refs {
            self.add_parcel(parcel_ref);
        }
    }

    /// Parcel refs in insertion order.
    pub fn parcel_refs(&self) -> &[ParcelRef] {
        &self.parcel_refs
    }

    /// Parcel refs joined with commas, as written to the output.
    pub fn joined_parcel_refs(&self) -> String {
        self.parcel_refs.join(",")
    }
}

/// An address the provider could not resolve, with the parcels it carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedAddress {
    pub address: Address,
    pub parcel_refs: Vec<ParcelRef>,
}

/// Ordered visiting sequence for one zone. Never contains the depot.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedRoute {
    pub zone: ZoneName,
    pub stops: Vec<DeliveryPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(41.47855, 2.07228)).unwrap();
        assert_eq!(json, "[41.47855,2.07228]");
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Coordinate::new(41.47855, 2.07228));
    }

    #[test]
    fn test_coordinate_key_is_exact() {
        let a = Coordinate::new(41.1, 2.1);
        let b = Coordinate::new(41.1, 2.1000000001);
        assert_ne!(a.key(), b.key());
        assert_eq!(Coordinate::new(0.0, -0.0).key(), Coordinate::new(0.0, 0.0).key());
    }

    #[test]
    fn test_parcels_keep_order_and_drop_duplicates() {
        let mut point = DeliveryPoint::new(Coordinate::new(1.0, 2.0), "A");
        assert!(point.add_parcel("p2"));
        assert!(point.add_parcel("p1"));
        assert!(!point.add_parcel("p2"));
        assert_eq!(point.parcel_refs(), &["p2".to_string(), "p1".to_string()]);
        assert_eq!(point.joined_parcel_refs(), "p2,p1");
    }

    #[test]
    fn test_row_filter_defaults_to_none() {
        let row: DeliveryRow =
            serde_json::from_str(r#"{"parcel_ref":"X1","address":"CARRER MAJOR 1"}"#).unwrap();
        assert_eq!(row, DeliveryRow::new("X1", "CARRER MAJOR 1"));
    }
}
