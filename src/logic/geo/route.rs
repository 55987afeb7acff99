use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PIPELINE_COORDS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar distance over lat/lng deltas
    pub fn planar_distance(&self, other: &LatLng) -> f64 {
        (other.lat - self.lat).hypot(other.lng - self.lng)
    }

    pub fn lerp(&self, other: &LatLng, ratio: f64) -> LatLng {
        LatLng {
            lat: self.lat + (other.lat - self.lat) * ratio,
            lng: self.lng + (other.lng - self.lng) * ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("Route needs at least one waypoint")]
    Empty,

    #[error("Waypoint {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Ordered pipeline waypoints. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LatLng>", into = "Vec<LatLng>")]
pub struct Route {
    waypoints: Vec<LatLng>,
}

impl Route {
    pub fn new(waypoints: Vec<LatLng>) -> Result<Self, RouteError> {
        if waypoints.is_empty() {
            return Err(RouteError::Empty);
        }
        if let Some(index) = waypoints
            .iter()
            .position(|p| !p.lat.is_finite() || !p.lng.is_finite())
        {
            return Err(RouteError::NonFinite { index });
        }
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[LatLng] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> LatLng {
        self.waypoints[0]
    }

    pub fn last(&self) -> LatLng {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Waypoint at the middle index (initial map centre, degenerate fallback)
    pub fn midpoint(&self) -> LatLng {
        self.waypoints[self.waypoints.len() / 2]
    }

    /// Lengths of consecutive sub-segments
    pub fn segment_lengths(&self) -> Vec<f64> {
        self.waypoints
            .windows(2)
            .map(|w| w[0].planar_distance(&w[1]))
            .collect()
    }

    pub fn total_length(&self) -> f64 {
        self.segment_lengths().iter().sum()
    }

    /// South-west and north-east corners
    pub fn bounds(&self) -> (LatLng, LatLng) {
        let first = self.first();
        self.waypoints.iter().fold((first, first), |(sw, ne), p| {
            (
                LatLng::new(sw.lat.min(p.lat), sw.lng.min(p.lng)),
                LatLng::new(ne.lat.max(p.lat), ne.lng.max(p.lng)),
            )
        })
    }
}

impl Default for Route {
    fn default() -> Self {
        Self {
            waypoints: DEFAULT_PIPELINE_COORDS
                .iter()
                .map(|&(lat, lng)| LatLng::new(lat, lng))
                .collect(),
        }
    }
}

impl TryFrom<Vec<LatLng>> for Route {
    type Error = RouteError;

    fn try_from(waypoints: Vec<LatLng>) -> Result<Self, Self::Error> {
        Route::new(waypoints)
    }
}

impl From<Route> for Vec<LatLng> {
    fn from(route: Route) -> Self {
        route.waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert_eq!(Route::new(vec![]), Err(RouteError::Empty));
        assert_eq!(
            Route::new(vec![LatLng::new(1.0, 1.0), LatLng::new(f64::NAN, 0.0)]),
            Err(RouteError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn test_default_route_midpoint_and_bounds() {
        let route = Route::default();
        assert_eq!(route.len(), 3);
        assert_eq!(route.midpoint(), LatLng::new(39.78, -100.44));

        let (sw, ne) = route.bounds();
        assert_eq!(sw, LatLng::new(39.76, -100.50));
        assert_eq!(ne, LatLng::new(39.80, -100.38));
    }

    #[test]
    fn test_total_length_is_planar() {
        let route = Route::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(3.0, 4.0),
            LatLng::new(3.0, 10.0),
        ])
        .unwrap();
        assert_eq!(route.segment_lengths(), vec![5.0, 6.0]);
        assert_eq!(route.total_length(), 11.0);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Route = serde_json::from_str(r#"[{"lat":1.0,"lng":2.0}]"#).unwrap();
        assert_eq!(ok.len(), 1);

        let err = serde_json::from_str::<Route>("[]");
        assert!(err.is_err());
    }
}
