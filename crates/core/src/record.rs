//! Persisted documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Fields, RecordId};

/// One persisted document in a named collection.
///
/// `id` is system-assigned by the store on insert and never appears inside
/// `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Raw field value, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field rendered as display text; `None` when absent, null, or blank.
    pub fn display(&self, field: &str) -> Option<String> {
        self.get(field).and_then(display_value)
    }

    /// Field as a string slice when it holds a JSON string.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }
}

/// Render a scalar JSON value as display text.
///
/// Null, blank strings, arrays, and objects yield `None`; documents in this
/// system only carry scalars.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Build a [`Fields`] map from key/value pairs.
pub fn fields<I, K>(entries: I) -> Fields
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn display_skips_blank_and_null() {
        let record = Record::new(
            "r1",
            fields([
                ("name", json!("Ada")),
                ("email", json!("   ")),
                ("phone", Value::Null),
                ("fine", json!(25)),
            ]),
        );
        assert_eq!(record.display("name").as_deref(), Some("Ada"));
        assert_eq!(record.display("email"), None);
        assert_eq!(record.display("phone"), None);
        assert_eq!(record.display("missing"), None);
        assert_eq!(record.display("fine").as_deref(), Some("25"));
    }

    #[test]
    fn str_field_ignores_numbers() {
        let record = Record::new("r1", fields([("studentId", json!(1001))]));
        assert_eq!(record.str_field("studentId"), None);
    }
}
