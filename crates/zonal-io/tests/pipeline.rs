//! End-to-end integration tests: fixture files -> run -> CSV/JSON -> read back.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use tempfile::TempDir;
use zonal_core::{PolygonId, ZonalError};
use zonal_io::{read_polygons, read_raster, run_files, SUMMARY_FILE, TABLE_FILE};

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn run_fixture(out: &Path, attributes: bool) -> anyhow::Result<zonal_core::ZonalReport> {
    let csv = fixture_path("attributes.csv");
    run_files(
        &fixture_path("config.json"),
        &fixture_path("raster.json"),
        &fixture_path("districts.geojson"),
        attributes.then_some(csv.as_path()),
        out,
    )
}

#[test]
fn report_values() {
    let dir = TempDir::new().unwrap();
    let report = run_fixture(dir.path(), true).expect("fixture run should succeed");

    let stats = |id: &str| report.table.get(&PolygonId::from(id)).unwrap().stats;

    // 2×2 block [10, 11, 14, 15].
    assert_eq!(stats("150101").count(), 4);
    assert_eq!(stats("150101").mean(), Some(12.5));

    // 4×2 block minus one hole cell (19) and one no-data cell.
    let ancon = stats("150102");
    assert_eq!(ancon.count(), 6);
    assert_relative_eq!(ancon.mean().unwrap(), 128.0 / 6.0, epsilon = 1e-12);
    assert_eq!(ancon.min(), Some(18.0));
    assert_eq!(ancon.max(), Some(24.0));

    // Two parts: [12, 13] and [null, 17].
    assert_eq!(stats("150103").count(), 3);
    assert_eq!(stats("150103").mean(), Some(14.0));

    // Entirely west of the grid.
    assert_eq!(stats("070101").count(), 0);
    assert_eq!(stats("070101").mean(), None);

    // Means {12.5, 14, 21.33}: threshold 12.8 flags only 150101.
    assert_relative_eq!(report.risk.threshold.unwrap(), 12.8, epsilon = 1e-12);
    assert_eq!(report.summary.at_risk_unit_count, 1);
    assert_relative_eq!(report.summary.national_mean.unwrap(), 220.0 / 13.0, epsilon = 1e-12);
    assert_eq!(report.summary.national_min, Some(10.0));
    assert_eq!(report.summary.national_max, Some(24.0));
}

#[test]
fn table_file_round_trip() {
    let dir = TempDir::new().unwrap();
    run_fixture(dir.path(), true).unwrap();

    let mut rdr = csv::Reader::from_path(dir.path().join(TABLE_FILE)).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(&header[..4], ["id", "DEPARTAMEN", "NAME", "POBLACION"]);
    assert_eq!(header.last().map(String::as_str), Some("at_risk"));

    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    let ids: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(ids, ["150101", "150102", "150103", "070101"]);

    // Side-table values override and extend polygon properties.
    assert_eq!(&rows[0][2], "Lima Cercado");
    assert_eq!(&rows[0][3], "268352");
    assert_eq!(&rows[0][12], "true");
    // Empty CSV cell leaves the polygon value alone.
    assert_eq!(&rows[2][2], "Miraflores");
    assert_eq!(&rows[2][3], "99337");
    assert_eq!(&rows[1][3], "");

    let callao = &rows[3];
    assert_eq!(&callao[1], "CALLAO");
    assert_eq!(&callao[4], "0");
    assert!((5..13).all(|i| callao[i].is_empty()));
}

#[test]
fn summary_file_round_trip() {
    let dir = TempDir::new().unwrap();
    run_fixture(dir.path(), false).unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(content["total_units"], 4);
    assert_eq!(content["units_with_data"], 3);
    assert_eq!(content["at_risk_unit_count"], 1);
    assert_eq!(content["risk_metric"], "mean");
    assert_eq!(content["lowest_mean_unit"]["id"], "150101");
    assert_eq!(content["highest_mean_unit"]["id"], "150102");
}

#[test]
fn readers_accept_fixtures() {
    let grid = read_raster(&fixture_path("raster.json")).unwrap();
    assert_eq!((grid.width(), grid.height()), (4, 4));
    assert_eq!(grid.valid_cell_count(), 14);

    let units = read_polygons(&fixture_path("districts.geojson"), "UBIGEO").unwrap();
    assert_eq!(units.len(), 4);
    assert_eq!(units.polygons[1].parts[0].holes.len(), 1);
    assert_eq!(units.polygons[2].parts.len(), 2);
}

#[test]
fn missing_input_names_the_stage() {
    let dir = TempDir::new().unwrap();
    let err = run_files(
        &fixture_path("config.json"),
        &fixture_path("no_such_raster.json"),
        &fixture_path("districts.geojson"),
        None,
        dir.path(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("loading raster"));
    assert!(!dir.path().join(TABLE_FILE).exists());
}

#[test]
fn unsupported_polygon_crs_aborts_without_output() {
    let dir = TempDir::new().unwrap();
    let text = fs::read_to_string(fixture_path("districts.geojson"))
        .unwrap()
        .replace("urn:ogc:def:crs:OGC:1.3:CRS84", "EPSG:24891");
    let polygons = dir.path().join("psad56.geojson");
    fs::write(&polygons, text).unwrap();

    let out = dir.path().join("out");
    let err = run_files(&fixture_path("config.json"), &fixture_path("raster.json"), &polygons, None, &out)
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<ZonalError>(), Some(ZonalError::CrsUnsupported { .. })));
    assert!(!out.join(TABLE_FILE).exists());
}
