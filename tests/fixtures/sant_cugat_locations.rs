//! Sant Cugat del Vallès locations for realistic test fixtures.
//!
//! Each group lies inside the polygon of the zone it is named after in the
//! default configuration. Within a group, locations are listed in the order
//! they project onto that zone's route line.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

pub const DEPOT: Location = Location::new("CARRER DE SOLSONA 22", 41.47855, 2.07228);

// ============================================================================
// Indust
// ============================================================================

pub const INDUST: &[Location] = &[
    Location::new("CARRER DE LA INDUSTRIA 4", 41.4800, 2.0830),
    Location::new("AVINGUDA DE LA GENERALITAT 30", 41.4830, 2.0860),
    Location::new("CARRER DE LA VERNEDA 12", 41.4790, 2.0930),
    Location::new("PASSEIG DE LA RIERA 7", 41.4750, 2.0960),
];

// ============================================================================
// Centre
// ============================================================================

pub const CENTRE: &[Location] = &[
    Location::new("PLAÇA OCTAVIA 1", 41.4720, 2.0800),
    Location::new("CARRER DE SANT ANTONI 18", 41.4700, 2.0900),
    Location::new("RAMBLA DEL CELLER 45", 41.4680, 2.0850),
    Location::new("AVINGUDA DE RIUS I TAULET 9", 41.4620, 2.0860),
];

// ============================================================================
// Mira
// ============================================================================

pub const MIRA: &[Location] = &[
    Location::new("CARRER DE LA MIRA-SOL 3", 41.4650, 2.0500),
    Location::new("PASSEIG DEL PINAR 21", 41.4700, 2.0450),
    Location::new("CARRER DEL BOSC 8", 41.4580, 2.0380),
];

// ============================================================================
// Outside every zone
// ============================================================================

pub const OUTSIDE: &[Location] = &[
    Location::new("PLAÇA DE CATALUNYA 1, BARCELONA", 41.38706, 2.17010),
    Location::new("CARRER DE TERRASSA 2", 41.5500, 2.1500),
];
