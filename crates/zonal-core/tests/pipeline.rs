//! End-to-end runs: projected polygons over a geographic raster → table → flags → summary.

use zonal_core::crs::Transformer;
use zonal_core::{
    run, Coord, Crs, EngineConfig, GeoTransform, Metric, Polygon, PolygonCollection, PolygonId, PolygonPart,
    RasterGrid, Ring, ZonalError,
};

const NODATA: f64 = -9999.0;

/// 20×20 grid of 0.1° cells over lon [-78, -76], lat [-13, -11].
/// Values cool towards the south: row r holds 12 − 0.5·r, plus a small
/// column term so units differ in spread. Two cells are no-data.
fn raster() -> RasterGrid {
    let mut data = Vec::with_capacity(400);
    for r in 0..20 {
        for c in 0..20 {
            data.push(12.0 - 0.5 * r as f64 + 0.05 * c as f64);
        }
    }
    data[0] = NODATA;
    data[21] = NODATA;
    RasterGrid::new(data, 20, 20, GeoTransform::north_up(-78.0, -11.0, 0.1, -0.1), Some(Crs::WGS84), Some(NODATA))
        .unwrap()
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
    Ring::new(vec![Coord::new(x0, y0), Coord::new(x1, y0), Coord::new(x1, y1), Coord::new(x0, y1)]).unwrap()
}

fn district(id: &str, dept: &str, parts: Vec<Ring>) -> Polygon {
    Polygon::new(id, parts.into_iter().map(PolygonPart::new).collect())
        .with_attribute("DISTRITO", id.to_uppercase())
        .with_attribute("DEPARTAMEN", dept)
}

fn geographic_districts() -> PolygonCollection {
    PolygonCollection::new(
        Some(Crs::WGS84),
        vec![
            district("norte", "LIMA", vec![rect(-78.0, -11.5, -77.0, -11.0)]),
            district("sur", "ICA", vec![rect(-78.0, -13.0, -76.0, -12.5)]),
            // Two disjoint parts: 2×2 cells and 3×1 cells.
            district("islas", "LIMA", vec![rect(-77.0, -12.2, -76.8, -12.0), rect(-76.5, -12.4, -76.2, -12.3)]),
            district("mar", "CALLAO", vec![rect(-80.0, -12.5, -79.0, -12.0)]),
        ],
    )
}

fn to_utm18s(coll: &PolygonCollection) -> PolygonCollection {
    let tf = Transformer::new(Crs::WGS84, Crs::utm(18, true)).unwrap();
    let polygons = coll
        .polygons
        .iter()
        .map(|p| {
            let mut q = p.clone();
            q.parts = p
                .parts
                .iter()
                .map(|part| PolygonPart::new(part.exterior.try_map_coords(|c| tf.transform(c)).unwrap()))
                .collect();
            q
        })
        .collect();
    PolygonCollection::new(Some(Crs::utm(18, true)), polygons)
}

#[test]
fn projected_polygons_match_geographic_run() {
    let grid = raster();
    let cfg = EngineConfig::default();
    let direct = run(&grid, geographic_districts(), &cfg).unwrap();
    let projected = run(&grid, to_utm18s(&geographic_districts()), &cfg).unwrap();

    for (a, b) in direct.table.iter().zip(projected.table.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.stats.count(), b.stats.count(), "count differs for {}", a.id);
        assert_eq!(a.stats.mean(), b.stats.mean());
    }
}

#[test]
fn counts_cover_parts_and_mask_nodata() {
    let report = run(&raster(), geographic_districts(), &EngineConfig::default()).unwrap();
    let count = |id: &str| report.table.get(&PolygonId::from(id)).unwrap().stats.count();
    // 10 × 5 cells, minus the two no-data cells in the north-west corner.
    assert_eq!(count("norte"), 48);
    assert_eq!(count("sur"), 100);
    assert_eq!(count("islas"), 4 + 3);
    assert_eq!(count("mar"), 0);
}

#[test]
fn empty_unit_is_a_row_with_nulls() {
    let report = run(&raster(), geographic_districts(), &EngineConfig::default()).unwrap();
    let rows: Vec<_> = report.rows().collect();
    assert_eq!(rows.len(), 4);
    let mar = &rows[3];
    assert_eq!(mar.id.as_str(), "mar");
    assert_eq!(mar.attributes["DEPARTAMEN"], "CALLAO");
    assert_eq!(mar.stats.count, 0);
    assert_eq!(mar.stats.mean, None);
    assert_eq!(mar.stats.range, None);
    assert_eq!(mar.at_risk, None);

    let json = serde_json::to_value(mar).unwrap();
    assert!(json["percentile_10"].is_null());
    assert!(json["at_risk"].is_null());
}

#[test]
fn statistics_are_ordered() {
    let report = run(&raster(), geographic_districts(), &EngineConfig::default()).unwrap();
    for r in report.table.iter().filter(|r| r.stats.has_data()) {
        let s = r.stats.summary().unwrap();
        assert!(s.min <= s.percentile_10 && s.percentile_10 <= s.percentile_90 && s.percentile_90 <= s.max);
        assert!(s.min <= s.mean && s.mean <= s.max);
        assert_eq!(s.range, s.max - s.min);
    }
}

#[test]
fn coldest_unit_is_flagged() {
    let report = run(&raster(), geographic_districts(), &EngineConfig::default()).unwrap();
    assert_eq!(report.risk.is_at_risk(&PolygonId::from("sur")), Some(true));
    assert_eq!(report.risk.is_at_risk(&PolygonId::from("norte")), Some(false));
    assert_eq!(report.summary.at_risk_unit_count, 1);
    assert_eq!(report.summary.total_units, 4);
    assert_eq!(report.summary.units_with_data, 3);
    assert_eq!(report.summary.lowest_mean_unit.as_ref().unwrap().id.as_str(), "sur");
    assert_eq!(report.summary.risk_metric, Metric::Mean);
}

#[test]
fn repeated_runs_are_identical() {
    let grid = raster();
    let cfg = EngineConfig { risk_metric: Metric::Percentile10, ..EngineConfig::default() };
    let a = run(&grid, to_utm18s(&geographic_districts()), &cfg).unwrap();
    let b = run(&grid, to_utm18s(&geographic_districts()), &cfg).unwrap();
    assert_eq!(a, b);
}

#[test]
fn undeclared_polygon_crs_fails_the_run() {
    let mut coll = geographic_districts();
    coll.crs = None;
    assert!(matches!(
        run(&raster(), coll, &EngineConfig::default()),
        Err(ZonalError::CrsUndefined { .. })
    ));
}
