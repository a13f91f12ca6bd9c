//! Test fixtures for courier-routes.
//!
//! Provides realistic test data including:
//! - Sant Cugat del Vallès delivery locations, one group per configured zone
//! - A scripted geocoder that records every provider call

#![allow(dead_code)]

pub mod sant_cugat_locations;

pub use sant_cugat_locations::*;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use courier_routes::error::GeocodeError;
use courier_routes::model::Coordinate;
use courier_routes::traits::Geocoder;

#[derive(Debug, Clone)]
enum Answer {
    Found(Coordinate),
    NoMatch,
    Fail(u16),
}

/// Geocoder with canned answers. Unknown addresses answer "no match".
#[derive(Debug, Default)]
pub struct FakeGeocoder {
    answers: HashMap<String, Answer>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.answers
            .insert(address.to_string(), Answer::Found(Coordinate::new(lat, lng)));
        self
    }

    pub fn at(self, address: &str, location: &Location) -> Self {
        self.with(address, location.lat, location.lng)
    }

    pub fn no_match(mut self, address: &str) -> Self {
        self.answers.insert(address.to_string(), Answer::NoMatch);
        self
    }

    pub fn failing(mut self, address: &str, status: u16) -> Self {
        self.answers.insert(address.to_string(), Answer::Fail(status));
        self
    }

    /// Makes every call take at least `millis`.
    pub fn with_latency(mut self, millis: u64) -> Self {
        self.latency = Duration::from_millis(millis);
        self
    }

    /// Most calls ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Addresses sent to the provider, sorted.
    pub fn called_with(&self) -> Vec<String> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

impl Geocoder for FakeGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(address.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.answers.get(address) {
            Some(Answer::Found(coordinate)) => Ok(Some(*coordinate)),
            Some(Answer::Fail(status)) => Err(GeocodeError::Http(*status)),
            Some(Answer::NoMatch) | None => Ok(None),
        }
    }
}
