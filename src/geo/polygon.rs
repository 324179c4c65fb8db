/*!
 * Protected area boundaries.
 *
 * Park geometry is owned by another part of the system, the analysis only ever needs to ask
 * whether a point is inside of it. The [Boundary] trait is that seam, and [ProtectedArea] is a
 * simple multi-polygon implementation of it.
 */
use super::{BoundingBox, Coord, Geo};
use crate::error::BoundaryError;

/// Tolerance, in degrees, for deciding a point lies on an edge.
const EDGE_EPS: f64 = 1.0e-10;

/**
 * Membership test for an area.
 *
 * Points exactly on the edge of the area are NOT contained in it.
 */
pub trait Boundary {
    fn contains(&self, coord: Coord) -> bool;
}

impl<F> Boundary for F
where
    F: Fn(Coord) -> bool,
{
    fn contains(&self, coord: Coord) -> bool {
        self(coord)
    }
}

/// A simple polygon with optional holes.
#[derive(Debug, Clone)]
pub struct Polygon {
    exterior: Vec<Coord>,
    holes: Vec<Vec<Coord>>,
    bbox: BoundingBox,
}

impl Polygon {
    /**
     * Create a polygon from its outer ring.
     *
     * The ring may or may not repeat the first vertex at the end. It needs at least three
     * distinct, finite vertices.
     */
    pub fn new(exterior: Vec<Coord>) -> Result<Self, BoundaryError> {
        Self::with_holes(exterior, vec![])
    }

    /// Create a polygon with holes cut out of it.
    pub fn with_holes(exterior: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Result<Self, BoundaryError> {
        let exterior = close_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(close_ring)
            .collect::<Result<Vec<_>, _>>()?;

        let mut bbox = BoundingBox::default();
        for &vertex in &exterior {
            bbox.expand_to(vertex);
        }

        Ok(Polygon {
            exterior,
            holes,
            bbox,
        })
    }

    /// The outer ring, first vertex not repeated.
    pub fn exterior(&self) -> &[Coord] {
        &self.exterior
    }

    pub fn holes(&self) -> &[Vec<Coord>] {
        &self.holes
    }
}

impl Boundary for Polygon {
    fn contains(&self, coord: Coord) -> bool {
        if !self.bbox.contains(coord) {
            return false;
        }

        if !ring_interior_contains(&self.exterior, coord) {
            return false;
        }

        !self.holes.iter().any(|hole| {
            on_ring_edge(hole, coord) || ring_interior_contains(hole, coord)
        })
    }
}

impl Geo for Polygon {
    fn centroid(&self) -> Coord {
        vertex_mean(&self.exterior)
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/**
 * A named protected area made of one or more polygons.
 *
 * A point is inside the area if it is inside any of the polygons.
 */
#[derive(Debug, Clone)]
pub struct ProtectedArea {
    id: String,
    polygons: Vec<Polygon>,
    bbox: BoundingBox,
}

impl ProtectedArea {
    pub fn new(id: impl Into<String>, polygons: Vec<Polygon>) -> Result<Self, BoundaryError> {
        if polygons.is_empty() {
            return Err(BoundaryError {
                msg: "protected area has no polygons",
            });
        }

        let mut bbox = BoundingBox::default();
        for poly in &polygons {
            let pbox = poly.bounding_box();
            bbox.expand_to(pbox.ll);
            bbox.expand_to(pbox.ur);
        }

        Ok(ProtectedArea {
            id: id.into(),
            polygons,
            bbox,
        })
    }

    /// Convenience for a single polygon area without holes.
    pub fn from_ring(id: impl Into<String>, ring: Vec<Coord>) -> Result<Self, BoundaryError> {
        Self::new(id, vec![Polygon::new(ring)?])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }
}

impl Boundary for ProtectedArea {
    fn contains(&self, coord: Coord) -> bool {
        self.bbox.contains(coord) && self.polygons.iter().any(|poly| poly.contains(coord))
    }
}

impl Geo for ProtectedArea {
    fn centroid(&self) -> Coord {
        let vertices: Vec<Coord> = self
            .polygons
            .iter()
            .flat_map(|poly| poly.exterior.iter().copied())
            .collect();
        vertex_mean(&vertices)
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                     Ring Helpers
 *-----------------------------------------------------------------------------------------------*/
fn close_ring(mut ring: Vec<Coord>) -> Result<Vec<Coord>, BoundaryError> {
    if ring
        .iter()
        .any(|c| !c.lat.is_finite() || !c.lon.is_finite())
    {
        return Err(BoundaryError {
            msg: "polygon vertex is not finite",
        });
    }

    // Drop the closing vertex, the ring helpers wrap around on their own.
    while ring.len() > 1 && ring[0].is_close(ring[ring.len() - 1], EDGE_EPS) {
        ring.pop();
    }

    ring.dedup_by(|a, b| a.is_close(*b, EDGE_EPS));

    if ring.len() < 3 {
        return Err(BoundaryError {
            msg: "polygon ring needs at least 3 distinct vertices",
        });
    }

    Ok(ring)
}

fn ring_edges(ring: &[Coord]) -> impl Iterator<Item = (Coord, Coord)> + '_ {
    ring.iter()
        .copied()
        .zip(ring.iter().copied().cycle().skip(1))
}

fn on_ring_edge(ring: &[Coord], coord: Coord) -> bool {
    ring_edges(ring).any(|(a, b)| {
        let cross = (b.lon - a.lon) * (coord.lat - a.lat) - (b.lat - a.lat) * (coord.lon - a.lon);
        if cross.abs() > EDGE_EPS {
            return false;
        }

        coord.lon >= a.lon.min(b.lon) - EDGE_EPS
            && coord.lon <= a.lon.max(b.lon) + EDGE_EPS
            && coord.lat >= a.lat.min(b.lat) - EDGE_EPS
            && coord.lat <= a.lat.max(b.lat) + EDGE_EPS
    })
}

/// Even-odd ray casting, points on the edge are outside.
fn ring_interior_contains(ring: &[Coord], coord: Coord) -> bool {
    if on_ring_edge(ring, coord) {
        return false;
    }

    let mut inside = false;
    for (a, b) in ring_edges(ring) {
        if (a.lat > coord.lat) != (b.lat > coord.lat) {
            let lon_cross = a.lon + (coord.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
            if coord.lon < lon_cross {
                inside = !inside;
            }
        }
    }

    inside
}

fn vertex_mean(vertices: &[Coord]) -> Coord {
    let n = vertices.len() as f64;
    let (lat, lon) = vertices
        .iter()
        .fold((0.0, 0.0), |(lat, lon), c| (lat + c.lat, lon + c.lon));
    Coord {
        lat: lat / n,
        lon: lon / n,
    }
}
