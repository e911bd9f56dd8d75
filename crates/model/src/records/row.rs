use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One row of a structured query result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    /// Column lookup is case-insensitive: Postgres folds unquoted
    /// identifiers to lower case while MySQL keeps them as written.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    /// `None` when the column is absent or NULL.
    pub fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(|f| f.value.as_ref())
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.field_values.push(FieldValue::new(name, Some(value)));
        self
    }
}
