//! Report writer: per-unit CSV table and summary JSON.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use zonal_core::{Metric, SummaryMetadata, ZonalReport};

use crate::IoError;

/// File name of the per-unit table inside the output directory.
pub const TABLE_FILE: &str = "zonal_statistics.csv";
/// File name of the run summary inside the output directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes a finished [`ZonalReport`] into an output directory.
///
/// Creates the directory on construction if it does not exist.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write one row per unit, in input order, to [`TABLE_FILE`].
    ///
    /// Columns: `id`, every attribute name seen on any unit (sorted), the
    /// eight statistics, `at_risk`. Missing attributes, statistics of units
    /// without data and their risk flag are empty fields.
    #[instrument(skip_all)]
    pub fn write_table(&self, report: &ZonalReport) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(TABLE_FILE);
        let csv_err = |e: csv::Error| IoError::CsvWrite {
            path: path.clone(),
            source: e,
        };

        let attribute_names: BTreeSet<&str> =
            report.table.iter().flat_map(|r| r.attributes.keys().map(String::as_str)).collect();

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_err)?;

        let header = std::iter::once("id")
            .chain(attribute_names.iter().copied())
            .chain(Metric::ALL.iter().map(|m| m.name()))
            .chain(std::iter::once("at_risk"));
        wtr.write_record(header).map_err(csv_err)?;

        for row in report.rows() {
            let mut record: Vec<String> = Vec::with_capacity(2 + attribute_names.len() + Metric::ALL.len());
            record.push(row.id.to_string());
            record.extend(attribute_names.iter().map(|k| row.attributes.get(*k).cloned().unwrap_or_default()));
            record.push(row.stats.count.to_string());
            record.extend(
                [
                    row.stats.mean,
                    row.stats.min,
                    row.stats.max,
                    row.stats.std,
                    row.stats.percentile_10,
                    row.stats.percentile_90,
                    row.stats.range,
                ]
                .into_iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            record.push(row.at_risk.map(|b| b.to_string()).unwrap_or_default());
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), rows = report.table.len(), "statistics table written");
        Ok(path)
    }

    /// Write the run summary as pretty JSON to [`SUMMARY_FILE`].
    #[instrument(skip_all)]
    pub fn write_summary(&self, summary: &SummaryMetadata) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "summary written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zonal_core::{
        run, Coord, Crs, EngineConfig, GeoTransform, Polygon, PolygonCollection, PolygonPart, RasterGrid, Ring,
    };

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        Ring::new(vec![Coord::new(x0, y0), Coord::new(x1, y0), Coord::new(x1, y1), Coord::new(x0, y1)]).unwrap()
    }

    /// 4×1 grid [1, 2, 3, 4]; "low" covers cells 0-1, "high" cells 2-3,
    /// "off" lies outside the grid.
    fn report() -> ZonalReport {
        let grid = RasterGrid::new(
            vec![1.0, 2.0, 3.0, 4.0],
            4,
            1,
            GeoTransform::north_up(0.0, 1.0, 1.0, -1.0),
            Some(Crs::WGS84),
            None,
        )
        .unwrap();
        let polys = vec![
            Polygon::new("low", vec![PolygonPart::new(rect(0.0, 0.0, 2.0, 1.0))]).with_attribute("REGION", "A"),
            Polygon::new("high", vec![PolygonPart::new(rect(2.0, 0.0, 4.0, 1.0))]).with_attribute("ZONE", "z1"),
            Polygon::new("off", vec![PolygonPart::new(rect(10.0, 0.0, 11.0, 1.0))]).with_attribute("REGION", "B"),
        ];
        run(&grid, PolygonCollection::new(Some(Crs::WGS84), polys), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn table_columns_and_rows() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let path = writer.write_table(&report()).unwrap();
        assert_eq!(path, dir.path().join(TABLE_FILE));

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            header,
            [
                "id",
                "REGION",
                "ZONE",
                "count",
                "mean",
                "min",
                "max",
                "std",
                "percentile_10",
                "percentile_90",
                "range",
                "at_risk"
            ]
        );

        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "low");
        assert_eq!(&rows[0][1], "A");
        assert_eq!(&rows[0][2], "");
        assert_eq!(&rows[0][3], "2");
        assert_eq!(&rows[0][4], "1.5");
        assert_eq!(&rows[0][11], "true");
        assert_eq!(&rows[1][2], "z1");
        assert_eq!(&rows[1][11], "false");

        let off = &rows[2];
        assert_eq!(&off[0], "off");
        assert_eq!(&off[3], "0");
        assert!((4..12).all(|i| off[i].is_empty()));
    }

    #[test]
    fn summary_json() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(&dir.path().join("nested").join("out")).unwrap();
        let path = writer.write_summary(&report().summary).unwrap();

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["total_units"], 3);
        assert_eq!(v["units_with_data"], 2);
        assert_eq!(v["national_mean"], 2.5);
        assert_eq!(v["risk_metric"], "mean");
        assert_eq!(v["lowest_mean_unit"]["id"], "low");
        assert_eq!(v["at_risk_unit_count"], 1);
    }

    #[test]
    fn summary_write_errors_name_the_output_file() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        fs::create_dir(dir.path().join(SUMMARY_FILE)).unwrap();

        let err = writer.write_summary(&report().summary).unwrap_err();
        assert!(matches!(err, IoError::WriteFile { .. }));
        assert!(err.to_string().ends_with(SUMMARY_FILE));

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = IoError::Serialize { path: dir.path().join(SUMMARY_FILE), source };
        assert!(err.to_string().starts_with("cannot serialize "));
        assert!(!err.to_string().contains("invalid JSON"));
    }
}
