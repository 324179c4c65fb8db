/*!
 * Geographic calculations.
 *
 * The fire group analysis works on daily centroids that are at most a few hundred kilometers
 * apart, so most distances here are flat-earth approximations that use a fixed number of
 * kilometers per degree. Those approximations are part of the published behavior of the
 * algorithms, so they must not be swapped out for more accurate formulas.
 */
use std::fmt::{self, Display};

pub use polygon::{Boundary, Polygon, ProtectedArea};

mod polygon;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }

    /// Whether both components are within `eps` degrees of the other coordinate.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A latitude-longitude aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// The lower left (south west) corner.
    pub ll: Coord,
    /// The upper right (north east) corner.
    pub ur: Coord,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            ll: Coord {
                lat: f64::INFINITY,
                lon: f64::INFINITY,
            },
            ur: Coord {
                lat: -f64::INFINITY,
                lon: -f64::INFINITY,
            },
        }
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} <---> {}", self.ll, self.ur)
    }
}

impl BoundingBox {
    /**
     * Build a square box centered on a point.
     *
     * The buffer is converted to degrees with [KM_PER_DEGREE] in both directions, so boxes away
     * from the equator are narrower in longitude than the buffer suggests.
     */
    pub fn around(center: Coord, buffer_km: f64) -> Self {
        let buffer_deg = buffer_km / KM_PER_DEGREE;
        BoundingBox {
            ll: Coord {
                lat: center.lat - buffer_deg,
                lon: center.lon - buffer_deg,
            },
            ur: Coord {
                lat: center.lat + buffer_deg,
                lon: center.lon + buffer_deg,
            },
        }
    }

    /// Grow the box so it includes `coord`.
    pub fn expand_to(&mut self, coord: Coord) {
        self.ll.lat = self.ll.lat.min(coord.lat);
        self.ll.lon = self.ll.lon.min(coord.lon);
        self.ur.lat = self.ur.lat.max(coord.lat);
        self.ur.lon = self.ur.lon.max(coord.lon);
    }

    /// Check if a coordinate is inside the box, edges included.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.ll.lat
            && coord.lat <= self.ur.lat
            && coord.lon >= self.ll.lon
            && coord.lon <= self.ur.lon
    }

    /// A box is empty until at least one coordinate has been added to it.
    pub fn is_empty(&self) -> bool {
        self.ll.lat > self.ur.lat || self.ll.lon > self.ur.lon
    }
}

/// Items with a location and an extent.
pub trait Geo {
    fn centroid(&self) -> Coord;
    fn bounding_box(&self) -> BoundingBox;
}

/**
 * Latitude corrected flat-earth distance.
 *
 * `sqrt((dlat * 111)^2 + (dlon * 111 * cos(mean_lat))^2)`. This is the distance used for
 * linking clusters, for movement speeds, and for distances traveled inside a protected area.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn local_distance_km(a: Coord, b: Coord) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let dlat_km = (b.lat - a.lat).abs() * KM_PER_DEGREE;
    let dlon_km = (b.lon - a.lon).abs() * KM_PER_DEGREE * mean_lat.cos();

    f64::sqrt(dlat_km * dlat_km + dlon_km * dlon_km)
}
