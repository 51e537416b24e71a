//! Geographic calculations

use crate::types::Point;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Road distance coefficient (straight line to road)
pub const ROAD_COEFFICIENT: f64 = 1.3;

/// Average bus speed in km/h for offline travel time estimation
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Great-circle distance between two points in kilometers
pub fn haversine_distance(from: &Point, to: &Point) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Straight-line distance in raw degree space.
///
/// Only meaningful for ranking nearby points against each other.
pub fn euclidean_degrees(from: &Point, to: &Point) -> f64 {
    ((to.lat - from.lat).powi(2) + (to.lng - from.lng).powi(2)).sqrt()
}

/// Estimate road distance in kilometers from straight-line distance
pub fn road_distance(from: &Point, to: &Point, coefficient: f64) -> f64 {
    haversine_distance(from, to) * coefficient
}

/// Estimate travel time in minutes at a constant speed
pub fn travel_time_minutes(road_km: f64, speed_kmh: f64) -> f64 {
    road_km / speed_kmh * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_prague_brno() {
        let prague = Point::new(50.0755, 14.4378);
        let brno = Point::new(49.1951, 16.6068);

        let distance = haversine_distance(&prague, &brno);

        // Prague to Brno is approximately 185 km
        assert!((distance - 185.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Point::new(50.0, 14.0);
        assert!(haversine_distance(&point, &point).abs() < 0.001);
    }

    #[test]
    fn test_road_distance_applies_coefficient() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.2);

        let ratio = road_distance(&a, &b, ROAD_COEFFICIENT) / haversine_distance(&a, &b);
        assert!((ratio - ROAD_COEFFICIENT).abs() < 1e-9);
    }

    #[test]
    fn test_travel_time() {
        // 20 km at 40 km/h is half an hour
        assert!((travel_time_minutes(20.0, AVERAGE_SPEED_KMH) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_euclidean_degrees_ranks_points() {
        let school = Point::new(50.0, 14.0);
        let near = Point::new(50.01, 14.01);
        let far = Point::new(50.2, 13.9);
        assert!(euclidean_degrees(&school, &near) < euclidean_degrees(&school, &far));
    }
}
