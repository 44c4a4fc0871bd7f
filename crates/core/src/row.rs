//! Display-oriented projection of a [`Record`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::schema::{CollectionSchema, StatusTone};
use crate::types::RecordId;

/// Placeholder rendered for any missing or empty value.
pub const SENTINEL: &str = "N/A";

/// One grid row, keyed by the identity of the Record it projects.
///
/// Every projected column of the schema has a cell; cells never hold an
/// empty string (they hold [`SENTINEL`] instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowViewModel {
    pub id: RecordId,
    pub cells: BTreeMap<String, String>,
    pub tone: StatusTone,
}

impl RowViewModel {
    /// Project a record through a schema: rename each source field to its
    /// column key and default anything absent to [`SENTINEL`].
    pub fn project(record: &Record, schema: &CollectionSchema) -> Self {
        let cells = schema
            .projected_columns()
            .map(|col| {
                let value = col
                    .source
                    .as_deref()
                    .and_then(|source| record.display(source))
                    .unwrap_or_else(|| SENTINEL.to_string());
                (col.key.clone(), value)
            })
            .collect();
        Self::from_cells(record.id.clone(), cells, schema)
    }

    /// Build a row from display cells, normalising blanks to [`SENTINEL`]
    /// and deriving the status tone.
    pub fn from_cells(
        id: RecordId,
        cells: BTreeMap<String, String>,
        schema: &CollectionSchema,
    ) -> Self {
        let cells: BTreeMap<String, String> = cells
            .into_iter()
            .map(|(k, v)| {
                let v = if v.trim().is_empty() {
                    SENTINEL.to_string()
                } else {
                    v
                };
                (k, v)
            })
            .collect();
        let tone = schema
            .status
            .as_ref()
            .and_then(|s| cells.get(&s.column))
            .map(|v| schema.tone_for(v))
            .unwrap_or_default();
        Self { id, cells, tone }
    }

    /// Cell text for a column key; [`SENTINEL`] when the row has no such cell.
    pub fn cell(&self, key: &str) -> &str {
        self.cells.get(key).map_or(SENTINEL, String::as_str)
    }

    /// Whether a cell holds a real value rather than the placeholder.
    pub fn has_value(&self, key: &str) -> bool {
        self.cell(key) != SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::fields;
    use crate::schema::offenses_schema;

    #[test]
    fn projection_renames_and_defaults() {
        let schema = offenses_schema();
        let record = Record::new(
            "o1",
            fields([
                ("studentId", json!("S-100")),
                ("offenseType", json!("Late return")),
                ("fineAmount", json!(15)),
                ("status", json!("Pending")),
                ("internalNote", json!("never shown")),
            ]),
        );

        let row = RowViewModel::project(&record, &schema);
        assert_eq!(row.id, "o1");
        assert_eq!(row.cell("student_id"), "S-100");
        assert_eq!(row.cell("offense"), "Late return");
        assert_eq!(row.cell("fine"), "15");
        assert_eq!(row.cell("description"), SENTINEL);
        assert_eq!(row.cell("date"), SENTINEL);
        assert!(!row.cells.contains_key("internalNote"));
        assert!(!row.cells.contains_key("actions"));
        assert_eq!(row.tone, StatusTone::Warning);
    }

    #[test]
    fn every_projected_column_has_a_cell() {
        let schema = offenses_schema();
        let row = RowViewModel::project(&Record::new("empty", Default::default()), &schema);
        assert_eq!(row.cells.len(), schema.projected_columns().count());
        assert!(row.cells.values().all(|v| v == SENTINEL));
        assert_eq!(row.tone, StatusTone::Neutral);
    }

    #[test]
    fn from_cells_normalises_blanks() {
        let schema = offenses_schema();
        let cells = BTreeMap::from([
            ("offense".to_string(), "  ".to_string()),
            ("status".to_string(), "Resolved".to_string()),
        ]);
        let row = RowViewModel::from_cells("o2".into(), cells, &schema);
        assert_eq!(row.cell("offense"), SENTINEL);
        assert!(!row.has_value("offense"));
        assert_eq!(row.tone, StatusTone::Positive);
    }
}
