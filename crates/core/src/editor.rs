//! Record Editor Dialog: a typed field schema bound to a scratch buffer.
//!
//! The dialog owns only its open row identity, the [`EditBuffer`], and the
//! inline errors of the last submit attempt. It never talks to the store;
//! the manager turns a validated buffer into a partial update with
//! [`EditBuffer::to_patch`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{CoreError, FieldError};
use crate::row::{RowViewModel, SENTINEL};
use crate::schema::{CollectionSchema, FieldDef, FieldKind};
use crate::types::{Fields, RecordId};

/// Scratch copy of the editable cells of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditBuffer {
    values: BTreeMap<String, String>,
}

impl EditBuffer {
    /// Seed from a row. Placeholder cells start out empty so a required
    /// field that only ever held [`SENTINEL`] is caught by validation.
    pub fn seed(row: &RowViewModel, fields: &[FieldDef]) -> Self {
        let values = fields
            .iter()
            .map(|f| {
                let cell = row.cell(&f.key);
                let value = if cell == SENTINEL { "" } else { cell };
                (f.key.clone(), value.to_string())
            })
            .collect();
        Self { values }
    }

    /// Build a buffer directly from key/value pairs.
    pub fn from_values<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Partial-update payload: one entry per editor field present in the
    /// buffer, keyed by the Record field the column is projected from.
    ///
    /// Keys outside the editor schema are dropped. Number fields that parse
    /// and print back unchanged are written as JSON numbers, anything else
    /// as text; blank values are written as null.
    pub fn to_patch(&self, schema: &CollectionSchema) -> Fields {
        schema
            .editor
            .iter()
            .filter_map(|field| {
                let raw = self.values.get(&field.key)?;
                let source = schema.source_for(&field.key)?;
                Some((source.to_string(), typed_value(field.kind, raw)))
            })
            .collect()
    }

    /// Full document for an insert: every projected column present in the
    /// buffer, keyed by its source field. Columns without an editor field
    /// (such as the owner reference) are written as text.
    pub fn to_document(&self, schema: &CollectionSchema) -> Fields {
        schema
            .projected_columns()
            .filter_map(|col| {
                let raw = self.values.get(&col.key)?;
                let source = col.source.as_deref()?;
                let kind = schema
                    .editor_field(&col.key)
                    .map_or(FieldKind::Text, |f| f.kind);
                Some((source.to_string(), typed_value(kind, raw)))
            })
            .collect()
    }
}

fn typed_value(kind: FieldKind, raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if kind == FieldKind::Number {
        // Only store a JSON number when it prints back exactly as typed.
        if let Ok(n) = trimmed.parse::<Number>() {
            if n.to_string() == trimmed {
                return Value::Number(n);
            }
        }
    }
    Value::String(raw.to_string())
}

/// An open edit dialog for one row.
#[derive(Debug, Clone)]
pub struct EditorDialog {
    row_id: RecordId,
    fields: Vec<FieldDef>,
    buffer: EditBuffer,
    errors: Vec<FieldError>,
}

impl EditorDialog {
    pub fn open(row: &RowViewModel, schema: &CollectionSchema) -> Self {
        Self {
            row_id: row.id.clone(),
            fields: schema.editor.clone(),
            buffer: EditBuffer::seed(row, &schema.editor),
            errors: Vec::new(),
        }
    }

    pub fn row_id(&self) -> &str {
        &self.row_id
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// Update one bound input. Clears any inline error on that field.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> Result<(), CoreError> {
        if !self.fields.iter().any(|f| f.key == key) {
            return Err(CoreError::Validation(format!(
                "Field '{key}' is not editable"
            )));
        }
        self.buffer.set(key, value);
        self.errors.retain(|e| e.field != key);
        Ok(())
    }

    /// Check required fields. On failure the errors are kept for inline
    /// display and also returned.
    pub fn validate(&mut self) -> Result<(), CoreError> {
        self.errors = self
            .fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| self.buffer.get(&f.key).map_or(true, |v| v.trim().is_empty()))
            .map(|f| FieldError {
                field: f.key.clone(),
                message: format!("{} is required", f.label),
            })
            .collect();

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self.errors.clone()))
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == key)
            .map(|e| e.message.as_str())
    }

    /// Consume the dialog, yielding the row identity and its buffer.
    pub fn into_parts(self) -> (RecordId, EditBuffer) {
        (self.row_id, self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::record::{fields, Record};
    use crate::schema::{offenses_schema, payments_schema};

    fn offense_row() -> RowViewModel {
        let record = Record::new(
            "o1",
            fields([
                ("studentId", json!("S-1")),
                ("offenseType", json!("Noise")),
                ("fineAmount", json!(10)),
                ("status", json!("Pending")),
            ]),
        );
        RowViewModel::project(&record, &offenses_schema())
    }

    #[test]
    fn seed_blanks_placeholders() {
        let schema = offenses_schema();
        let dialog = EditorDialog::open(&offense_row(), &schema);
        let buffer = dialog.buffer();
        assert_eq!(buffer.get("offense"), Some("Noise"));
        assert_eq!(buffer.get("description"), Some(""));
        assert_eq!(buffer.get("fine"), Some("10"));
        // Only editor fields are seeded.
        assert_eq!(buffer.get("student_id"), None);
    }

    #[test]
    fn required_fields_reported_inline() {
        let schema = offenses_schema();
        let mut dialog = EditorDialog::open(&offense_row(), &schema);
        dialog.set_field("offense", "  ").unwrap();

        let err = dialog.validate().unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(ref errs) if errs.len() == 2);
        assert_eq!(dialog.error_for("offense"), Some("Offense is required"));
        assert_eq!(dialog.error_for("date"), Some("Date is required"));

        dialog.set_field("offense", "Food in stacks").unwrap();
        assert!(dialog.error_for("offense").is_none());
        dialog.set_field("date", "2024-05-02").unwrap();
        assert!(dialog.validate().is_ok());
        assert!(dialog.errors().is_empty());
    }

    #[test]
    fn non_editor_field_is_rejected() {
        let schema = offenses_schema();
        let mut dialog = EditorDialog::open(&offense_row(), &schema);
        assert!(dialog.set_field("student_id", "S-2").is_err());
    }

    #[test]
    fn patch_maps_keys_to_sources_and_types_numbers() {
        let schema = payments_schema();
        let mut buffer = EditBuffer::from_values([
            ("amount", "12.5"),
            ("reference", "RCPT-9"),
            ("paid_on", ""),
            ("status", "Paid"),
            ("student_id", "S-9"),
        ]);
        buffer.set("unknown", "x");

        let patch = buffer.to_patch(&schema);
        assert_eq!(patch.get("amount"), Some(&json!(12.5)));
        assert_eq!(patch.get("referenceNumber"), Some(&json!("RCPT-9")));
        assert_eq!(patch.get("paymentDate"), Some(&Value::Null));
        assert_eq!(patch.get("status"), Some(&json!("Paid")));
        assert!(!patch.contains_key("studentId"));
        assert!(!patch.contains_key("unknown"));
        assert_eq!(patch.len(), 4);
    }

    #[test]
    fn numbers_that_would_change_are_kept_as_text() {
        let schema = payments_schema();
        let patch_for = |amount: &str| {
            EditBuffer::from_values([("amount", amount)])
                .to_patch(&schema)
                .remove("amount")
        };

        assert_eq!(patch_for("7"), Some(json!(7)));
        assert_eq!(
            patch_for("12345678901234567890"),
            Some(json!(12345678901234567890u64))
        );
        assert_eq!(patch_for("1e2"), Some(json!("1e2")));
        assert_eq!(patch_for("12.50"), Some(json!("12.50")));
        assert_eq!(patch_for("99999999999999999999999"), Some(json!("99999999999999999999999")));
    }

    #[test]
    fn document_covers_owner_column() {
        let schema = offenses_schema();
        let buffer = EditBuffer::from_values([
            ("student_id", "S-7"),
            ("offense", "Noise"),
            ("fine", "15"),
            ("actions", "x"),
        ]);
        let doc = buffer.to_document(&schema);
        assert_eq!(doc.get("studentId"), Some(&json!("S-7")));
        assert_eq!(doc.get("offenseType"), Some(&json!("Noise")));
        assert_eq!(doc.get("fineAmount"), Some(&json!(15)));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn unparsable_number_is_kept_as_text() {
        let schema = payments_schema();
        let buffer = EditBuffer::from_values([("amount", "twelve")]);
        assert_eq!(buffer.to_patch(&schema).get("amount"), Some(&json!("twelve")));
    }
}
