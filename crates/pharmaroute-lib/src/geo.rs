//! Coordinates and the great-circle distance estimator.
//!
//! All distances are in metres on a spherical earth. The estimator is used for
//! candidate pre-ranking, as the A* heuristic and as the last-resort routing
//! fallback, so it must never overestimate road distance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a validated coordinate.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the latitude/longitude range invariant.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    /// Whether the coordinate satisfies the range invariant.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Earth-centred Cartesian position in metres, used by the spatial index.
    ///
    /// Straight-line (chord) distance between two such points is never larger
    /// than the great-circle distance, so the KD-tree ordering matches the
    /// haversine ordering.
    pub fn to_cartesian(&self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        [
            EARTH_RADIUS_M * lat.cos() * lon.cos(),
            EARTH_RADIUS_M * lat.cos() * lon.sin(),
            EARTH_RADIUS_M * lat.sin(),
        ]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Great-circle distance between two coordinates in metres.
///
/// Symmetric, deterministic and zero only for identical inputs.
pub fn estimate_distance(a: Coordinate, b: Coordinate) -> Result<f64> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_m(a, b))
}

/// Haversine distance without validation, for coordinates already checked.
pub(crate) fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    // Distinct points closer than the float resolution must not collapse to zero.
    (EARTH_RADIUS_M * c).max(f64::MIN_POSITIVE)
}

/// Initial bearing (forward azimuth) from `a` to `b` in degrees, in `[0, 360)`.
pub fn initial_bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    let bearing = y.atan2(x).to_degrees();
    bearing.rem_euclid(360.0)
}

/// Signed smallest rotation from `from` to `to` in degrees, in `(-180, 180]`.
///
/// Negative values turn left (counter-clockwise), positive values turn right.
pub fn bearing_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Per-segment haversine lengths of a polyline.
pub fn segment_lengths(path: &[Coordinate]) -> Vec<f64> {
    path.windows(2).map(|pair| haversine_m(pair[0], pair[1])).collect()
}

/// Total haversine length of a polyline.
pub fn polyline_length(path: &[Coordinate]) -> f64 {
    segment_lengths(path).iter().sum()
}

/// Eight-point compass label for a bearing.
pub fn compass_label(bearing: f64) -> &'static str {
    const LABELS: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let sector = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    LABELS[sector]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    #[test]
    fn same_point_is_zero() {
        let a = coord(34.0349, -4.9764);
        assert_eq!(estimate_distance(a, a).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(34.0, -5.0);
        let b = coord(34.02, -5.03);
        assert_eq!(
            estimate_distance(a, b).unwrap(),
            estimate_distance(b, a).unwrap()
        );
    }

    #[test]
    fn distinct_points_are_positive() {
        let a = coord(34.0, -5.0);
        let b = coord(34.0, -5.000001);
        assert!(estimate_distance(a, b).unwrap() > 0.0);
    }

    #[test]
    fn sub_resolution_offsets_stay_positive() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 1e-200);
        let d = estimate_distance(a, b).unwrap();
        assert!(d > 0.0);
        assert_eq!(d, estimate_distance(b, a).unwrap());
    }

    #[test]
    fn known_distance_fes_to_rabat() {
        // Fès (34.0331, -5.0003) to Rabat (34.0209, -6.8416) is roughly 170 km.
        let d = estimate_distance(coord(34.0331, -5.0003), coord(34.0209, -6.8416)).unwrap();
        assert!(d > 165_000.0 && d < 175_000.0, "got {d}");
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let bad = Coordinate { lat: 91.0, lon: 0.0 };
        let err = estimate_distance(bad, coord(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { .. }));
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn bearing_due_east_and_north() {
        let origin = coord(0.0, 0.0);
        assert!((initial_bearing(origin, coord(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!(initial_bearing(origin, coord(1.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn bearing_delta_wraps() {
        assert_eq!(bearing_delta(350.0, 10.0), 20.0);
        assert_eq!(bearing_delta(10.0, 350.0), -20.0);
        assert_eq!(bearing_delta(0.0, 180.0), 180.0);
    }

    #[test]
    fn chord_never_exceeds_haversine() {
        let a = coord(34.0, -5.0);
        let b = coord(34.5, -4.2);
        let pa = a.to_cartesian();
        let pb = b.to_cartesian();
        let chord = ((pa[0] - pb[0]).powi(2) + (pa[1] - pb[1]).powi(2) + (pa[2] - pb[2]).powi(2))
            .sqrt();
        assert!(chord <= haversine_m(a, b));
    }

    #[test]
    fn compass_labels() {
        assert_eq!(compass_label(0.0), "north");
        assert_eq!(compass_label(359.0), "north");
        assert_eq!(compass_label(95.0), "east");
        assert_eq!(compass_label(225.0), "southwest");
    }
}
