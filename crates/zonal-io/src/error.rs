//! I/O error types for zonal-io.

use std::path::PathBuf;

use zonal_core::ZonalError;

/// Errors from reading inputs, validating them, and writing the report.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when an input file does not exist or is unreadable.
    #[error("cannot read {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a JSON document is malformed or has the wrong shape.
    #[error("invalid JSON in {path}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        path: PathBuf,
        offset: u64,
        source: csv::Error,
    },

    /// Returned when a GeoJSON document parses as JSON but is not a usable
    /// polygon feature collection.
    #[error("invalid GeoJSON in {path}: feature {feature}: {reason}")]
    GeoJson {
        path: PathBuf,
        /// Zero-based feature index, or `0` for collection-level problems.
        feature: usize,
        reason: String,
    },

    /// Returned when the declared CRS member cannot be parsed.
    #[error("unrecognised CRS \"{name}\" in {path}")]
    UnknownCrs { path: PathBuf, name: String },

    /// Returned when a feature lacks the configured id property.
    #[error("feature {feature} in {path} has no \"{field}\" property")]
    MissingId {
        path: PathBuf,
        feature: usize,
        field: String,
    },

    /// Returned when the attribute table has no column named after the id field.
    #[error("attribute table {path} has no \"{column}\" column")]
    MissingIdColumn { path: PathBuf, column: String },

    /// Returned when the same id appears twice in the attribute table.
    #[error("duplicate id \"{id}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateAttributeId {
        path: PathBuf,
        id: String,
        /// Zero-based row index of the first occurrence (excluding header).
        first_row: usize,
        second_row: usize,
    },

    /// Returned when file contents are well-formed but rejected by the engine
    /// model (bad raster shape, degenerate ring, ...).
    #[error("invalid contents in {path}")]
    Invalid {
        path: PathBuf,
        source: ZonalError,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when a report file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when a report value cannot be encoded as JSON.
    #[error("cannot serialize {path}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Returned when the CSV writer fails.
    #[error("cannot write CSV {path}")]
    CsvWrite { path: PathBuf, source: csv::Error },
}
