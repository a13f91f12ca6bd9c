//! courier-routes: delivery route construction for bicycle couriers.
//!
//! Raw delivery rows are geocoded through a persistent cache, split into
//! geographic zones and ordered per zone into a visiting sequence.

pub mod cache;
pub mod config;
pub mod error;
pub mod geocode;
pub mod metric;
pub mod model;
pub mod normalize;
pub mod ordering;
pub mod pipeline;
pub mod polyline;
pub mod projection;
pub mod resolver;
pub mod solver;
pub mod traits;
pub mod zones;
