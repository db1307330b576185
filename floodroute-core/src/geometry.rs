//! Coordinate primitives and the small amount of spherical/planar math the
//! engine needs.

use geo::{Coord, Point};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Meters;

/// Mean Earth radius (IUGG) in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Two coordinates closer than this (in degrees, on both axes) are equal
pub const COORDINATE_TOLERANCE_DEG: f64 = 1e-6;

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Finite and inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }

    /// Great-circle distance in metres
    pub fn distance_m(&self, other: &Coordinate) -> Meters {
        haversine_m(*self, *other)
    }

    pub fn approx_eq(&self, other: &Coordinate) -> bool {
        (self.lat - other.lat).abs() <= COORDINATE_TOLERANCE_DEG
            && (self.lon - other.lon).abs() <= COORDINATE_TOLERANCE_DEG
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(value: Coordinate) -> Self {
        Point::new(value.lon, value.lat)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Coord {
            x: value.lon,
            y: value.lat,
        }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(value: Coord<f64>) -> Self {
        Coordinate::new(value.y, value.x)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(value: Point<f64>) -> Self {
        Coordinate::new(value.y(), value.x())
    }
}

/// Haversine distance between two coordinates in metres
pub fn haversine_m(a: Coordinate, b: Coordinate) -> Meters {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Sum of great-circle distances along a polyline
pub fn polyline_length_m(points: &[Coordinate]) -> Meters {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_m(*a, *b))
        .sum()
}

/// Equirectangular projection to local metres around a reference latitude.
///
/// Accurate to well under a percent across a city, which is all the spatial
/// indices and corridor tests need. Great-circle distances reported to
/// callers always come from [`haversine_m`].
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    cos_ref: f64,
}

impl LocalProjection {
    pub fn centered_on(reference_lat: f64) -> Self {
        let cos_ref = reference_lat.to_radians().cos().abs().max(1e-6);
        Self { cos_ref }
    }

    /// Projection centred on the mean latitude of `points`
    pub fn for_points<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        let (sum, count) = points
            .into_iter()
            .filter(|c| c.is_finite())
            .fold((0.0, 0usize), |(sum, count), c| (sum + c.lat, count + 1));
        if count == 0 {
            Self::centered_on(0.0)
        } else {
            #[allow(clippy::cast_precision_loss)]
            Self::centered_on(sum / count as f64)
        }
    }

    pub fn project(&self, c: Coordinate) -> [f64; 2] {
        [
            c.lon.to_radians() * EARTH_RADIUS_M * self.cos_ref,
            c.lat.to_radians() * EARTH_RADIUS_M,
        ]
    }

    pub fn unproject(&self, p: [f64; 2]) -> Coordinate {
        Coordinate::new(
            (p[1] / EARTH_RADIUS_M).to_degrees(),
            (p[0] / (EARTH_RADIUS_M * self.cos_ref)).to_degrees(),
        )
    }
}

/// Midpoint of `a`–`b` pushed sideways by `fraction` of the `a`–`b` distance.
///
/// Positive fractions move to the left of the direction of travel, negative
/// ones to the right.
pub fn perpendicular_offset(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    let projection = LocalProjection::centered_on((a.lat + b.lat) / 2.0);
    let pa = projection.project(a);
    let pb = projection.project(b);
    let mid = [(pa[0] + pb[0]) / 2.0, (pa[1] + pb[1]) / 2.0];
    let dx = pb[0] - pa[0];
    let dy = pb[1] - pa[1];
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        return projection.unproject(mid);
    }
    let offset = fraction * len;
    let normal = [-dy / len, dx / len];
    projection.unproject([mid[0] + normal[0] * offset, mid[1] + normal[1] * offset])
}
