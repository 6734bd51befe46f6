//! Spatial math for hazard proximity and trip distances.

use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in decimal degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Haversine distance between two coordinates in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// True if `point` is within `threshold_m` of any waypoint.
///
/// Only waypoints are tested, not the segments between them. An empty
/// waypoint list is never near anything.
pub fn is_near(point: Coordinate, waypoints: &[Coordinate], threshold_m: f64) -> bool {
    waypoints
        .iter()
        .any(|waypoint| distance_meters(point, *waypoint) <= threshold_m)
}

/// Arithmetic midpoint of two coordinates (not the great-circle midpoint).
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate::new((a.lon + b.lon) / 2.0, (a.lat + b.lat) / 2.0)
}

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Degree-aligned box guaranteed to contain every point within `radius_m` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinate, radius_m: f64) -> Self {
        // Padded: the degree scales are ellipsoidal, distances are spherical.
        let radius_m = radius_m.max(0.0) * 1.01;
        let dlat = radius_m / meters_per_deg_lat(center.lat).max(1e-9);
        let min_lat = (center.lat - dlat).max(-90.0);
        let max_lat = (center.lat + dlat).min(90.0);

        // Longitude spans widen toward the poles; scale at the latitude farthest from the equator.
        let widest_lat = min_lat.abs().max(max_lat.abs());
        let per_deg_lon = meters_per_deg_lon(widest_lat);
        let (min_lon, max_lon) = if per_deg_lon <= 1.0 || widest_lat >= 89.9 {
            (-180.0, 180.0)
        } else {
            let dlon = radius_m / per_deg_lon;
            let min_lon = center.lon - dlon;
            let max_lon = center.lon + dlon;
            if min_lon < -180.0 || max_lon > 180.0 {
                // Crosses the antimeridian.
                (-180.0, 180.0)
            } else {
                (min_lon, max_lon)
            }
        };

        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOMBO: Coordinate = Coordinate::new(79.8612, 6.9271);
    const KANDY: Coordinate = Coordinate::new(80.6337, 7.2906);

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn colombo_to_kandy_is_about_95km() {
        let dist = distance_meters(COLOMBO, KANDY);
        assert!(
            (94_000.0..=96_000.0).contains(&dist),
            "expected ~95km, got {dist}"
        );
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (COLOMBO, KANDY),
            (Coordinate::new(-117.8265, 33.6846), Coordinate::new(151.2093, -33.8688)),
            (Coordinate::new(179.9, 0.0), Coordinate::new(-179.9, 0.0)),
        ];
        for (a, b) in pairs {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            assert!((ab - ba).abs() <= ab.abs() * 1e-6, "{ab} != {ba}");
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_meters(KANDY, KANDY), 0.0);
        assert_eq!(distance_meters(COLOMBO, COLOMBO), 0.0);
    }

    #[test]
    fn is_near_checks_waypoints_only() {
        let waypoints = [COLOMBO, KANDY];
        assert!(is_near(COLOMBO, &waypoints, 200.0));

        // Halfway along the path is nowhere near either endpoint.
        let halfway = midpoint(COLOMBO, KANDY);
        assert!(!is_near(halfway, &waypoints, 200.0));
    }

    #[test]
    fn is_near_with_no_waypoints_is_false() {
        assert!(!is_near(COLOMBO, &[], 1_000_000.0));
    }

    #[test]
    fn is_near_threshold_is_inclusive() {
        let nudged = Coordinate::new(COLOMBO.lon, COLOMBO.lat + 0.001);
        let dist = distance_meters(nudged, COLOMBO);
        assert!(is_near(nudged, &[COLOMBO], dist));
        assert!(!is_near(nudged, &[COLOMBO], dist - 0.01));
    }

    #[test]
    fn bounding_box_contains_points_within_radius() {
        let bbox = BoundingBox::around(COLOMBO, 5_000.0);
        let north = Coordinate::new(COLOMBO.lon, COLOMBO.lat + 0.04);
        let east = Coordinate::new(COLOMBO.lon + 0.04, COLOMBO.lat);
        assert!(distance_meters(COLOMBO, north) < 5_000.0);
        assert!(distance_meters(COLOMBO, east) < 5_000.0);
        assert!(bbox.contains(north));
        assert!(bbox.contains(east));
        assert!(!bbox.contains(KANDY));
    }

    #[test]
    fn bounding_box_near_antimeridian_spans_all_longitudes() {
        let bbox = BoundingBox::around(Coordinate::new(179.99, 0.0), 5_000.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
    }
}
