/// Planar vector geometry for administrative units.
/// All coordinate math uses f64. Axis order is always (x, y) = (easting, northing)
/// or (lon, lat), whatever the collection's CRS says.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::error::{Result, ZonalError};

/// A vertex in the collection's reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Stable identifier of an administrative unit (e.g. a district UBIGEO code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonId(String);

impl PolygonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PolygonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolygonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A closed ring of vertices. The first vertex is repeated as the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coord>", into = "Vec<Coord>")]
pub struct Ring(Vec<Coord>);

impl Ring {
    /// Build a ring, closing it if the caller left it open.
    /// Fewer than three distinct vertices is an error.
    pub fn new(mut vertices: Vec<Coord>) -> Result<Self> {
        if let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) {
            if first != last {
                vertices.push(first);
            }
        }
        if vertices.len() < 4 {
            return Err(ZonalError::InvalidGeometry {
                reason: format!("ring needs at least 3 vertices, got {}", vertices.len().saturating_sub(1)),
            });
        }
        if vertices.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(ZonalError::InvalidGeometry {
                reason: "ring has a non-finite vertex".to_string(),
            });
        }
        Ok(Self(vertices))
    }

    pub fn vertices(&self) -> &[Coord] {
        &self.0
    }

    /// Apply a fallible `f` to every vertex and revalidate the result.
    pub fn try_map_coords(&self, mut f: impl FnMut(Coord) -> Result<Coord>) -> Result<Self> {
        Ring::new(self.0.iter().map(|&c| f(c)).collect::<Result<Vec<_>>>()?)
    }
}

impl TryFrom<Vec<Coord>> for Ring {
    type Error = ZonalError;

    fn try_from(v: Vec<Coord>) -> Result<Self> {
        Ring::new(v)
    }
}

impl From<Ring> for Vec<Coord> {
    fn from(r: Ring) -> Self {
        r.0
    }
}

/// One connected piece of a unit: an exterior ring with optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonPart {
    pub exterior: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
}

impl PolygonPart {
    pub fn new(exterior: Ring) -> Self {
        Self { exterior, holes: Vec::new() }
    }

    pub fn with_holes(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Exterior first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

/// An administrative unit: id, geometry (possibly multi-part) and a free-form
/// attribute bag (name, parent-region codes, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: PolygonId,
    pub parts: Vec<PolygonPart>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Polygon {
    pub fn new(id: impl Into<PolygonId>, parts: Vec<PolygonPart>) -> Self {
        Self {
            id: id.into(),
            parts,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Axis-aligned bounds as (min_x, min_y, max_x, max_y). `None` for a unit
    /// without parts.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut it = self.parts.iter().flat_map(|p| p.exterior.vertices());
        let first = it.next()?;
        Some(it.fold((first.x, first.y, first.x, first.y), |(x0, y0, x1, y1), c| {
            (x0.min(c.x), y0.min(c.y), x1.max(c.x), y1.max(c.y))
        }))
    }
}

impl From<String> for PolygonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ordered set of units sharing one declared reference system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonCollection {
    pub crs: Option<Crs>,
    pub polygons: Vec<Polygon>,
}

impl PolygonCollection {
    pub fn new(crs: Option<Crs>, polygons: Vec<Polygon>) -> Self {
        Self { crs, polygons }
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Fails with the first identifier (in input order) seen twice.
    pub fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.polygons.len());
        for p in &self.polygons {
            if !seen.insert(&p.id) {
                return Err(ZonalError::PolygonIdConflict { id: p.id.clone() });
            }
        }
        Ok(())
    }
}
