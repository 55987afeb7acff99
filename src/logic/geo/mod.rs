//! Polyline Geolocator
//!
//! Maps a one-dimensional segment identifier onto a lat/lng point of the
//! pipeline route. Distances are planar over lat/lng deltas, which is good
//! enough for placing a marker on a map and nothing more.
//!
//! # Structure
//! - `route.rs`: `LatLng`, `Route`
//! - `locate.rs`: `locate`, `schematic_offset`

pub mod route;
pub mod locate;

pub use route::{LatLng, Route, RouteError};
pub use locate::{locate, schematic_offset};
