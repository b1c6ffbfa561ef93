//! CSV attribute side table, keyed by unit id.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, instrument, warn};
use zonal_core::{PolygonCollection, PolygonId};

use crate::IoError;

/// Descriptive columns for a set of units, read from a CSV side table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTable {
    /// Attribute column names, header order, id column excluded.
    pub columns: Vec<String>,
    rows: HashMap<PolygonId, BTreeMap<String, String>>,
}

impl AttributeTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &PolygonId) -> Option<&BTreeMap<String, String>> {
        self.rows.get(id)
    }
}

/// Read an attribute CSV whose `id_column` holds unit ids.
///
/// Cells are kept as text; empty cells are dropped so they never overwrite a
/// value carried by the polygon layer.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record or ragged row |
/// | [`IoError::MissingIdColumn`] | No header named `id_column` |
/// | [`IoError::DuplicateAttributeId`] | Same id appears twice |
#[instrument(skip_all, fields(path = %path.display(), id_column = %id_column))]
pub fn read_attributes(path: &Path, id_column: &str) -> Result<AttributeTable, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let csv_err = |e: csv::Error| IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    };

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);
    let header = rdr.headers().map_err(csv_err)?.clone();
    let id_index = header.iter().position(|h| h == id_column).ok_or_else(|| IoError::MissingIdColumn {
        path: path.to_path_buf(),
        column: id_column.to_string(),
    })?;
    let columns: Vec<String> =
        header.iter().enumerate().filter(|&(i, _)| i != id_index).map(|(_, h)| h.to_string()).collect();
    debug!(columns = columns.len(), "read CSV header");

    let mut rows = HashMap::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let id = record.get(id_index).unwrap_or_default().to_string();

        if let Some(&first_row) = seen.get(&id) {
            return Err(IoError::DuplicateAttributeId {
                path: path.to_path_buf(),
                id,
                first_row,
                second_row: row_index,
            });
        }
        seen.insert(id.clone(), row_index);

        let values: BTreeMap<String, String> = header
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|&(i, (_, v))| i != id_index && !v.is_empty())
            .map(|(_, (h, v))| (h.to_string(), v.to_string()))
            .collect();
        rows.insert(PolygonId::new(id), values);
    }

    info!(rows = rows.len(), "attribute table loaded");
    Ok(AttributeTable { columns, rows })
}

/// Merge side-table attributes into matching polygons. Side-table values win
/// over same-named polygon properties. Returns the number of polygons that
/// received attributes; side-table ids with no polygon are logged and skipped.
pub fn join_attributes(collection: &mut PolygonCollection, table: &AttributeTable) -> usize {
    let mut joined = 0;
    for polygon in &mut collection.polygons {
        if let Some(values) = table.get(&polygon.id) {
            polygon.attributes.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            joined += 1;
        }
    }

    let unknown = unmatched_ids(collection, table);
    if !unknown.is_empty() {
        warn!(ids = ?unknown, "attribute rows without a matching polygon ignored");
    }
    debug!(joined, "attributes joined");
    joined
}

/// Side-table ids with no polygon in `collection`, sorted.
fn unmatched_ids<'a>(collection: &PolygonCollection, table: &'a AttributeTable) -> Vec<&'a str> {
    let known: HashSet<&PolygonId> = collection.polygons.iter().map(|p| &p.id).collect();
    let mut unknown: Vec<&str> =
        table.rows.keys().filter(|id| !known.contains(id)).map(PolygonId::as_str).collect();
    unknown.sort_unstable();
    unknown
}
