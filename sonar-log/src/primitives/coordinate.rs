use super::LinearDimension;
use crate::types::{Result, SonarLogError};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::hash::{Hash, Hasher};

/// WGS84 equatorial radius, meters
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
/// WGS84 polar radius, meters
pub const POLAR_RADIUS: f64 = 6_356_752.314_245_18;
/// WGS84 mean radius, meters
pub const MEAN_RADIUS: f64 = 6_371_008.8;

/// A WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoordinatePoint {
    latitude: f64,
    longitude: f64,
}

impl CoordinatePoint {
    /// Build a point without range checks.
    ///
    /// Devices write odd values into the position fields, so decoding must
    /// accept whatever is stored. Use [`CoordinatePoint::try_new`] for user input.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SonarLogError::out_of_range(
                "latitude",
                format!("{} is outside [-90, 90]", latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SonarLogError::out_of_range(
                "longitude",
                format!("{} is outside [-180, 180]", longitude),
            ));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Build a point from degree + decimal-minute notation, e.g. `60° 07.328'`.
    /// The sign of the degrees applies to the minutes.
    pub fn from_degrees_minutes(
        lat_degrees: f64,
        lat_minutes: f64,
        lon_degrees: f64,
        lon_minutes: f64,
    ) -> Self {
        let combine = |degrees: f64, minutes: f64| {
            let magnitude = degrees.abs() + minutes / 60.0;
            if degrees.is_sign_negative() {
                -magnitude
            } else {
                magnitude
            }
        };
        Self::new(
            combine(lat_degrees, lat_minutes),
            combine(lon_degrees, lon_minutes),
        )
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    // -0.0 and 0.0 must compare and hash the same
    fn key(&self) -> (u64, u64) {
        ((self.latitude + 0.0).to_bits(), (self.longitude + 0.0).to_bits())
    }
}

impl PartialEq for CoordinatePoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CoordinatePoint {}

impl Hash for CoordinatePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for CoordinatePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Longitude difference in radians, wrapped into (-π, π]
fn longitude_delta(first: &CoordinatePoint, second: &CoordinatePoint) -> f64 {
    let delta = (second.longitude - first.longitude).to_radians();
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Distance on the WGS84 ellipsoid using meridional and prime-vertical radii
/// at the mid latitude. Accurate to decimeters over the short ranges used for
/// depth matching.
pub fn distance_on_ellipsoid(first: &CoordinatePoint, second: &CoordinatePoint) -> LinearDimension {
    let lat1 = first.latitude.to_radians();
    let lat2 = second.latitude.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = longitude_delta(first, second);
    let mid_lat = (lat1 + lat2) / 2.0;

    let (sin_mid, cos_mid) = mid_lat.sin_cos();
    let a = EQUATORIAL_RADIUS;
    let b = POLAR_RADIUS;
    let denominator = (a * cos_mid).powi(2) + (b * sin_mid).powi(2);
    let meridional = (a * b).powi(2) / denominator.powf(1.5);
    let prime_vertical = a * a / denominator.sqrt();

    let sin2_mid = sin_mid * sin_mid;
    let dlon2 = delta_lon * delta_lon;
    let q = delta_lat * meridional * (1.0 - (2.0 * dlon2 + dlon2 * sin2_mid) / 24.0);
    let p = delta_lon * prime_vertical * cos_mid * (1.0 + (delta_lat * delta_lat - dlon2 * sin2_mid) / 24.0);

    LinearDimension::from_meters((q * q + p * p).sqrt())
}

/// Great-circle distance on a sphere of WGS84 mean radius
pub fn distance_haversine(first: &CoordinatePoint, second: &CoordinatePoint) -> LinearDimension {
    let lat1 = first.latitude.to_radians();
    let lat2 = second.latitude.to_radians();
    let delta_lon = (second.longitude - first.longitude).to_radians();

    // Vincenty form of the central angle, stable near antipodes
    let y = ((lat2.cos() * delta_lon.sin()).powi(2)
        + (lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos()).powi(2))
    .sqrt();
    let x = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * delta_lon.cos();

    LinearDimension::from_meters(y.atan2(x) * MEAN_RADIUS)
}

/// Equirectangular approximation, good for a few hundred meters
pub fn distance_on_flat(first: &CoordinatePoint, second: &CoordinatePoint) -> LinearDimension {
    let mid_lat = ((first.latitude + second.latitude) / 2.0).to_radians();
    let dy = (second.latitude - first.latitude).to_radians() * MEAN_RADIUS;
    let dx = longitude_delta(first, second) * MEAN_RADIUS * mid_lat.cos();
    LinearDimension::from_meters((dx * dx + dy * dy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn base() -> CoordinatePoint {
        CoordinatePoint::from_degrees_minutes(60.0, 7.328, 32.0, 18.719)
    }

    #[test]
    fn test_try_new_validates_range() {
        assert!(CoordinatePoint::try_new(43.812, -164.243).is_ok());
        assert!(CoordinatePoint::try_new(90.5, 0.0).is_err());
        assert!(CoordinatePoint::try_new(0.0, -180.1).is_err());
    }

    #[test]
    fn test_equality_and_hash() {
        let a = CoordinatePoint::new(43.81234123, -164.243457567);
        let b = CoordinatePoint::new(43.81234123, -164.243457567);
        let c = CoordinatePoint::new(-60.813454769, 95.4567427812);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(CoordinatePoint::new(0.0, -0.0), CoordinatePoint::new(-0.0, 0.0));

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_degrees_minutes() {
        let p = CoordinatePoint::from_degrees_minutes(-10.0, 30.0, 20.0, 15.0);
        assert!((p.latitude() + 10.5).abs() < 1e-12);
        assert!((p.longitude() - 20.25).abs() < 1e-12);
    }

    #[test]
    fn test_long_distances() {
        let two = CoordinatePoint::from_degrees_minutes(60.0, 12.324, 32.0, 15.530);
        assert!((distance_haversine(&base(), &two).meters() - 9710.0).abs() < 5.0);
        assert!((distance_on_ellipsoid(&base(), &two).meters() - 9710.0).abs() < 30.0);

        let far = CoordinatePoint::from_degrees_minutes(57.0, 36.631, 29.0, 44.306);
        assert!((distance_haversine(&base(), &far).meters() - 315_800.0).abs() < 300.0);
    }

    #[test]
    fn test_short_distances() {
        let two = CoordinatePoint::from_degrees_minutes(60.0, 7.317, 32.0, 18.822);
        assert!((distance_haversine(&base(), &two).meters() - 97.3).abs() < 0.5);
        assert!((distance_on_ellipsoid(&base(), &two).meters() - 97.3).abs() < 0.5);

        let near = CoordinatePoint::from_degrees_minutes(60.0, 7.330, 32.0, 18.716);
        assert!((distance_haversine(&base(), &near).meters() - 5.1).abs() < 0.6);
        assert!((distance_on_flat(&base(), &near).meters() - 5.1).abs() < 2.0);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let east = CoordinatePoint::new(10.0, 179.9);
        let west = CoordinatePoint::new(10.0, -179.9);
        let expected = distance_haversine(&east, &CoordinatePoint::new(10.0, 179.7)).meters();
        assert!(expected > 20_000.0 && expected < 22_000.0);
        assert!((distance_on_ellipsoid(&east, &west).meters() - expected).abs() < 100.0);
        assert!((distance_on_ellipsoid(&west, &east).meters() - expected).abs() < 100.0);
        assert!((distance_on_flat(&east, &west).meters() - expected).abs() < 100.0);
        assert!((distance_haversine(&east, &west).meters() - expected).abs() < 1.0);
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(distance_on_ellipsoid(&base(), &base()).meters(), 0.0);
        assert_eq!(distance_haversine(&base(), &base()).meters(), 0.0);
    }
}
