//! GeoJSON polygon reader.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use zonal_core::{Coord, Crs, Polygon, PolygonCollection, PolygonPart, Ring};

use crate::{load_json, IoError};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    crs: Option<NamedCrs>,
    #[serde(default)]
    features: Vec<Feature>,
}

/// Legacy (2008) named CRS member: `{"type": "name", "properties": {"name": ...}}`.
#[derive(Debug, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

/// Positions may carry a third (elevation) ordinate; only x and y are kept.
type Position = Vec<f64>;

/// Read a GeoJSON `FeatureCollection` of `Polygon` / `MultiPolygon` features.
///
/// The unit id is taken from `properties[id_field]` (strings as-is, numbers
/// in their JSON spelling). Every other non-null property becomes a string
/// attribute. Without a `crs` member the collection is WGS 84 (RFC 7946).
#[instrument(skip_all, fields(path = %path.display(), id_field = %id_field))]
pub fn read_polygons(path: &Path, id_field: &str) -> Result<PolygonCollection, IoError> {
    let fc: FeatureCollection = load_json(path)?;
    let ctx = Context { path, id_field };

    if fc.kind != "FeatureCollection" {
        return Err(ctx.geojson(0, format!("expected a FeatureCollection, found \"{}\"", fc.kind)));
    }

    let crs = match fc.crs {
        Some(named) => named.properties.name.parse::<Crs>().map_err(|_| IoError::UnknownCrs {
            path: path.to_path_buf(),
            name: named.properties.name.clone(),
        })?,
        None => Crs::WGS84,
    };
    debug!(crs = %crs, features = fc.features.len(), "feature collection parsed");

    let polygons = fc
        .features
        .into_iter()
        .enumerate()
        .map(|(i, f)| ctx.feature(i, f))
        .collect::<Result<Vec<_>, _>>()?;

    info!(units = polygons.len(), crs = %crs, "polygons loaded");
    Ok(PolygonCollection::new(Some(crs), polygons))
}

struct Context<'a> {
    path: &'a Path,
    id_field: &'a str,
}

impl Context<'_> {
    fn geojson(&self, feature: usize, reason: impl Into<String>) -> IoError {
        IoError::GeoJson {
            path: self.path.to_path_buf(),
            feature,
            reason: reason.into(),
        }
    }

    fn path(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    fn feature(&self, index: usize, feature: Feature) -> Result<Polygon, IoError> {
        let mut properties = feature.properties.unwrap_or_default();

        let id = match properties.remove(self.id_field) {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(IoError::MissingId {
                    path: self.path(),
                    feature: index,
                    field: self.id_field.to_string(),
                })
            }
        };

        let geometry = feature.geometry.ok_or_else(|| self.geojson(index, "feature has no geometry"))?;
        let parts = self.parts(index, geometry)?;

        let attributes: BTreeMap<String, String> = properties
            .into_iter()
            .filter_map(|(k, v)| property_text(v).map(|s| (k, s)))
            .collect();

        Ok(Polygon { attributes, ..Polygon::new(id, parts) })
    }

    fn parts(&self, index: usize, geometry: Value) -> Result<Vec<PolygonPart>, IoError> {
        let kind = geometry.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
        let coordinates = geometry
            .get("coordinates")
            .cloned()
            .ok_or_else(|| self.geojson(index, format!("{kind} geometry has no coordinates")))?;
        let malformed = |e: serde_json::Error| self.geojson(index, format!("malformed {kind} coordinates: {e}"));

        let polygons: Vec<Vec<Vec<Position>>> = match kind.as_str() {
            "Polygon" => vec![serde_json::from_value(coordinates).map_err(malformed)?],
            "MultiPolygon" => serde_json::from_value(coordinates).map_err(malformed)?,
            other => return Err(self.geojson(index, format!("unsupported geometry type \"{other}\""))),
        };
        if polygons.is_empty() {
            return Err(self.geojson(index, "MultiPolygon has no parts"));
        }

        polygons.into_iter().map(|rings| self.part(index, rings)).collect()
    }

    /// First ring is the exterior, the rest are holes.
    fn part(&self, index: usize, rings: Vec<Vec<Position>>) -> Result<PolygonPart, IoError> {
        let mut rings = rings.into_iter().map(|r| self.ring(index, r));
        let exterior = rings.next().ok_or_else(|| self.geojson(index, "polygon without rings"))??;
        let holes = rings.collect::<Result<Vec<_>, _>>()?;
        Ok(PolygonPart::with_holes(exterior, holes))
    }

    fn ring(&self, index: usize, positions: Vec<Position>) -> Result<Ring, IoError> {
        let coords = positions
            .iter()
            .map(|p| match p.as_slice() {
                [x, y, ..] => Ok(Coord::new(*x, *y)),
                _ => Err(self.geojson(index, "position with fewer than two ordinates")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ring::new(coords).map_err(|source| IoError::Invalid { path: self.path(), source })
    }
}

fn property_text(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}
