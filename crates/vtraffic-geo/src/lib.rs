use thiserror::Error;
use vtraffic_core::LatLon;

/// Mean earth radius (6371 km) expressed in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 6_371.0 / 1.852;

const EPSILON: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("fraction must be in [0.0, 1.0], got {fraction}")]
    InvalidFraction { fraction: f64 },
}

/// Great-circle distance between two positions.
pub fn distance_nm(from: &LatLon, to: &LatLon) -> f64 {
    EARTH_RADIUS_NM
        * haversine_central_angle(
            from.latitude_radians(),
            from.longitude_radians(),
            to.latitude_radians(),
            to.longitude_radians(),
        )
}

/// Initial true bearing from `from` towards `to`, in `[0, 360)`.
pub fn initial_bearing_degrees(from: &LatLon, to: &LatLon) -> f64 {
    let lat1 = from.latitude_radians();
    let lat2 = to.latitude_radians();
    let delta_lon = to.longitude_radians() - from.longitude_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Point reached after travelling `distance_nm` along the great circle that
/// leaves `from` on `bearing_degrees`.
pub fn destination_point(from: &LatLon, distance_nm: f64, bearing_degrees: f64) -> LatLon {
    let angular = distance_nm / EARTH_RADIUS_NM;
    if angular.abs() <= EPSILON {
        return *from;
    }

    let lat1 = from.latitude_radians();
    let lon1 = from.longitude_radians();
    let bearing = bearing_degrees.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos())
        .clamp(-1.0, 1.0)
        .asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    LatLon::normalized(lat2.to_degrees(), lon2.to_degrees())
}

/// Half-way point along the great circle between two positions.
pub fn midpoint(from: &LatLon, to: &LatLon) -> LatLon {
    let lat1 = from.latitude_radians();
    let lat2 = to.latitude_radians();
    let lon1 = from.longitude_radians();
    let delta_lon = to.longitude_radians() - lon1;

    let bx = lat2.cos() * delta_lon.cos();
    let by = lat2.cos() * delta_lon.sin();
    let lat3 = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by.powi(2)).sqrt());
    let lon3 = lon1 + by.atan2(lat1.cos() + bx);

    LatLon::normalized(lat3.to_degrees(), lon3.to_degrees())
}

pub fn interpolate_great_circle(
    from: &LatLon,
    to: &LatLon,
    fraction: f64,
) -> Result<LatLon, GeoError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(GeoError::InvalidFraction { fraction });
    }

    if fraction <= EPSILON {
        return Ok(*from);
    }

    if (1.0 - fraction).abs() <= EPSILON {
        return Ok(*to);
    }

    let lat1 = from.latitude_radians();
    let lon1 = from.longitude_radians();
    let lat2 = to.latitude_radians();
    let lon2 = to.longitude_radians();

    let central_angle = haversine_central_angle(lat1, lon1, lat2, lon2);
    let sin_angle = central_angle.sin();
    if central_angle.abs() <= EPSILON || sin_angle.abs() <= EPSILON {
        return Ok(interpolate_linearly(from, to, fraction));
    }

    let weight_a = ((1.0 - fraction) * central_angle).sin() / sin_angle;
    let weight_b = (fraction * central_angle).sin() / sin_angle;

    let x = weight_a * lat1.cos() * lon1.cos() + weight_b * lat2.cos() * lon2.cos();
    let y = weight_a * lat1.cos() * lon1.sin() + weight_b * lat2.cos() * lon2.sin();
    let z = weight_a * lat1.sin() + weight_b * lat2.sin();

    Ok(LatLon::normalized(
        z.atan2((x.powi(2) + y.powi(2)).sqrt()).to_degrees(),
        y.atan2(x).to_degrees(),
    ))
}

/// Wraps an angle into `[0, 360)`.
pub fn normalize_degrees(value: f64) -> f64 {
    let normalized = value.rem_euclid(360.0);
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Signed rotation that takes `from` onto `to` the short way, in `(-180, 180]`.
pub fn signed_angle_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_degrees(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Smallest unsigned angle between two bearings, in `[0, 180]`.
pub fn angular_difference(left: f64, right: f64) -> f64 {
    signed_angle_delta(left, right).abs()
}

fn interpolate_linearly(from: &LatLon, to: &LatLon, fraction: f64) -> LatLon {
    let latitude = from.latitude() + (to.latitude() - from.latitude()) * fraction;
    let longitude = from.longitude()
        + shortest_longitude_delta(from.longitude(), to.longitude()) * fraction;
    LatLon::normalized(latitude, longitude)
}

fn haversine_central_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;

    let haversine = ((delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    2.0 * haversine.sqrt().asin()
}

fn shortest_longitude_delta(from: f64, to: f64) -> f64 {
    signed_angle_delta(from, to)
}

#[cfg(test)]
mod tests {
    use vtraffic_core::LatLon;

    use crate::{
        angular_difference, destination_point, distance_nm, initial_bearing_degrees,
        interpolate_great_circle, midpoint, normalize_degrees, signed_angle_delta, GeoError,
        EARTH_RADIUS_NM,
    };

    fn approx_equal(left: f64, right: f64, tolerance: f64) {
        let delta = (left - right).abs();
        assert!(
            delta <= tolerance,
            "expected {left} ~= {right} within {tolerance}, delta={delta}"
        );
    }

    fn point(latitude: f64, longitude: f64) -> LatLon {
        LatLon::new(latitude, longitude).expect("point should validate")
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let zurich = point(47.4647, 8.5492);
        approx_equal(distance_nm(&zurich, &zurich), 0.0, 1e-9);
    }

    #[test]
    fn distance_matches_known_city_pair_within_tolerance() {
        let san_francisco = point(37.7749, -122.4194);
        let los_angeles = point(34.0522, -118.2437);

        approx_equal(distance_nm(&san_francisco, &los_angeles), 301.9, 1.5);
    }

    #[test]
    fn initial_bearing_matches_expected_reference_value() {
        let san_francisco = point(37.7749, -122.4194);
        let los_angeles = point(34.0522, -118.2437);

        approx_equal(
            initial_bearing_degrees(&san_francisco, &los_angeles),
            136.5,
            1.0,
        );
    }

    #[test]
    fn destination_point_inverts_distance_and_bearing() {
        let start = point(46.9, 7.5);
        let end = destination_point(&start, 42.0, 63.0);

        approx_equal(distance_nm(&start, &end), 42.0, 1e-6);
        approx_equal(initial_bearing_degrees(&start, &end), 63.0, 1e-6);
    }

    #[test]
    fn destination_point_due_east_on_equator() {
        let end = destination_point(&point(0.0, 0.0), 60.0, 90.0);
        approx_equal(end.latitude(), 0.0, 1e-9);
        approx_equal(end.longitude(), (60.0 / EARTH_RADIUS_NM).to_degrees(), 1e-9);
    }

    #[test]
    fn destination_point_crosses_antimeridian() {
        let end = destination_point(&point(0.0, 179.9), 30.0, 90.0);
        assert!(end.longitude() < -179.0, "got {}", end.longitude());
    }

    #[test]
    fn midpoint_on_equator() {
        let middle = midpoint(&point(0.0, 0.0), &point(0.0, 90.0));
        approx_equal(middle.latitude(), 0.0, 1e-9);
        approx_equal(middle.longitude(), 45.0, 1e-9);
    }

    #[test]
    fn interpolation_matches_midpoint() {
        let left = point(10.0, 20.0);
        let right = point(15.0, 25.0);

        let interpolated =
            interpolate_great_circle(&left, &right, 0.5).expect("interpolation should work");
        let middle = midpoint(&left, &right);
        approx_equal(interpolated.latitude(), middle.latitude(), 1e-9);
        approx_equal(interpolated.longitude(), middle.longitude(), 1e-9);
    }

    #[test]
    fn interpolation_rejects_invalid_fraction() {
        let error = interpolate_great_circle(&point(0.0, 0.0), &point(1.0, 1.0), 1.1)
            .expect_err("fraction above one should be rejected");
        assert_eq!(error, GeoError::InvalidFraction { fraction: 1.1 });
    }

    #[test]
    fn interpolation_for_antipodal_points_stays_finite() {
        let middle = interpolate_great_circle(&point(0.0, 0.0), &point(0.0, 180.0), 0.5)
            .expect("midpoint should work");
        assert!(middle.latitude().is_finite());
        assert!(middle.longitude().is_finite());
    }

    #[test]
    fn angle_helpers_take_the_short_way() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(signed_angle_delta(350.0, 10.0), 20.0);
        assert_eq!(signed_angle_delta(10.0, 350.0), -20.0);
        assert_eq!(signed_angle_delta(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(30.0, 200.0), 170.0);
    }
}
