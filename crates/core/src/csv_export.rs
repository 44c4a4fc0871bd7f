//! CSV Exporter: rows and an ordered column list in, CSV text out.
//!
//! Pure and deterministic. Cells are quoted per RFC 4180 when they contain a
//! delimiter, quote, or line break; records end with `\n`. Offering the text
//! as a download is the caller's concern.

use serde::Serialize;

use crate::error::CoreError;
use crate::row::{RowViewModel, SENTINEL};
use crate::schema::CollectionSchema;

/// A column selected for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportColumn {
    pub key: String,
    /// Header text.
    pub label: String,
}

impl ExportColumn {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Resolve requested column keys against a schema, keeping the requested
/// order. Unknown keys and non-exportable (action/computed) columns are
/// silently dropped.
pub fn resolve_columns<S: AsRef<str>>(schema: &CollectionSchema, keys: &[S]) -> Vec<ExportColumn> {
    keys.iter()
        .filter_map(|key| schema.column(key.as_ref()))
        .filter(|col| col.exportable)
        .map(|col| ExportColumn::new(col.key.clone(), col.label.clone()))
        .collect()
}

/// Every exportable column of a schema, in display order.
pub fn default_columns(schema: &CollectionSchema) -> Vec<ExportColumn> {
    schema
        .columns
        .iter()
        .filter(|col| col.exportable)
        .map(|col| ExportColumn::new(col.key.clone(), col.label.clone()))
        .collect()
}

/// Serialize rows to CSV: one header line of column labels, then one line
/// per row in the given order. Empty or missing cells become [`SENTINEL`].
pub fn export_csv(rows: &[RowViewModel], columns: &[ExportColumn]) -> Result<String, CoreError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|c| c.label.as_str()))
        .map_err(|e| CoreError::Internal(format!("CSV write error: {e}")))?;

    for row in rows {
        let record = columns.iter().map(|c| {
            let cell = row.cell(&c.key);
            if cell.trim().is_empty() {
                SENTINEL
            } else {
                cell
            }
        });
        writer
            .write_record(record)
            .map_err(|e| CoreError::Internal(format!("CSV write error: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(format!("CSV encoding error: {e}")))
}
