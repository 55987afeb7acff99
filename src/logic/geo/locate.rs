use super::route::{LatLng, Route};
use crate::logic::snapshot::SegmentId;

/// Resolve a segment identifier to a point on the route.
///
/// The identifier's magnitude is folded onto `[0, reference_length)` and the
/// resulting fraction is walked along the route's cumulative length. Absent
/// ids count as 0; non-numeric ids, routes with fewer than two waypoints or no
/// length, and unusable reference lengths fall back to the route midpoint.
pub fn locate(segment: Option<&SegmentId>, route: &Route, reference_length: f64) -> LatLng {
    let value = match segment {
        None => 0.0,
        Some(id) => match id.value() {
            Some(v) => v,
            None => return route.midpoint(),
        },
    };

    if route.len() < 2 || !reference_length.is_finite() || reference_length <= 0.0 {
        return route.midpoint();
    }

    let t = (value.abs() % reference_length) / reference_length;
    interpolate_at(route, t).unwrap_or_else(|| route.midpoint())
}

/// Point at fraction `t` of the route length; `None` for zero-length routes
fn interpolate_at(route: &Route, t: f64) -> Option<LatLng> {
    let lengths = route.segment_lengths();
    let total: f64 = lengths.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let points = route.waypoints();
    let target = t * total;
    let mut acc = 0.0;

    for (i, seg) in lengths.iter().enumerate() {
        if acc + seg >= target {
            let ratio = if *seg == 0.0 { 0.0 } else { (target - acc) / seg };
            return Some(points[i].lerp(&points[i + 1], ratio));
        }
        acc += seg;
    }

    Some(route.last())
}

/// Marker position on the linear pipe schematic, in `[0, reference_length]`.
///
/// The remainder keeps the sign of the id, so negative ids pin to the inlet.
pub fn schematic_offset(segment: &SegmentId, reference_length: f64) -> f64 {
    match segment.value() {
        Some(v) if reference_length > 0.0 => (v % reference_length).clamp(0.0, reference_length),
        _ => (0.5 * reference_length).round(),
    }
}
