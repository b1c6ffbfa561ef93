//! Raster JSON reader.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};
use zonal_core::{Crs, GeoTransform, RasterGrid};

use crate::{load_json, IoError};

/// On-disk raster layout:
///
/// ```json
/// { "width": 4, "height": 2,
///   "transform": [-77.0, 0.25, 0.0, -12.0, 0.0, -0.25],
///   "crs": "EPSG:4326", "nodata": -9999.0,
///   "data": [1.0, 2.0, null, 4.0, 5.0, 6.0, 7.0, 8.0] }
/// ```
///
/// `data` is row-major, row 0 at the transform origin.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RasterFile {
    width: usize,
    height: usize,
    transform: GeoTransform,
    #[serde(default)]
    crs: Option<Crs>,
    #[serde(default)]
    nodata: Option<f64>,
    data: Vec<Option<f64>>,
}

/// Read a raster JSON document into a validated [`RasterGrid`].
///
/// `null` cells are no-data: they take the declared `nodata` sentinel, or
/// NaN when none is declared (NaN then becomes the sentinel).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::Json`] | Malformed JSON, unknown member, unparseable CRS |
/// | [`IoError::Invalid`] | Shape mismatch or non-invertible transform |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_raster(path: &Path) -> Result<RasterGrid, IoError> {
    let file: RasterFile = load_json(path)?;

    let nulls = file.data.iter().filter(|v| v.is_none()).count();
    let nodata = match file.nodata {
        None if nulls > 0 => Some(f64::NAN),
        nd => nd,
    };
    let fill = nodata.unwrap_or(f64::NAN);
    let data: Vec<f64> = file.data.into_iter().map(|v| v.unwrap_or(fill)).collect();
    debug!(nulls, nodata = ?nodata, "raster cells decoded");

    let grid = RasterGrid::new(data, file.width, file.height, file.transform, file.crs, nodata).map_err(|e| {
        IoError::Invalid {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    info!(
        width = grid.width(),
        height = grid.height(),
        crs = ?grid.crs().map(ToString::to_string),
        valid_cells = grid.valid_cell_count(),
        "raster loaded"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use zonal_core::ZonalError;

    fn write(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("raster.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reads_declared_sentinel_and_nulls() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{ "width": 2, "height": 2, "transform": [0, 1, 0, 2, 0, -1],
                 "crs": "EPSG:32718", "nodata": -9999, "data": [1, null, -9999, 4] }"#,
        );
        let g = read_raster(&path).unwrap();
        assert_eq!(g.crs(), Some(&Crs::utm(18, true)));
        assert_eq!(g.valid(0, 0), Some(1.0));
        assert_eq!(g.valid(0, 1), None);
        assert_eq!(g.valid(1, 0), None);
        assert_eq!(g.valid_cell_count(), 2);
    }

    #[test]
    fn nulls_without_sentinel_become_nan_nodata() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{ "width": 2, "height": 1, "transform": [0, 1, 0, 1, 0, -1], "data": [null, 3] }"#);
        let g = read_raster(&path).unwrap();
        assert!(g.nodata().unwrap().is_nan());
        assert_eq!(g.valid(0, 0), None);
        assert_eq!(g.valid(0, 1), Some(3.0));
        assert_eq!(g.crs(), None);
    }

    #[test]
    fn shape_mismatch_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{ "width": 3, "height": 1, "transform": [0, 1, 0, 1, 0, -1], "data": [1, 2] }"#);
        let err = read_raster(&path).unwrap_err();
        assert!(matches!(err, IoError::Invalid { source: ZonalError::InvalidRaster { .. }, .. }));
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_raster(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn bad_crs_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{ "width": 1, "height": 1, "transform": [0, 1, 0, 1, 0, -1], "crs": "WGS 84", "data": [1] }"#,
        );
        assert!(matches!(read_raster(&path).unwrap_err(), IoError::Json { .. }));
    }
}
