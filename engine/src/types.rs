//! Shared data types
//!
//! Schema fields, typed cell values, stored rows and query results.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column type of a table field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    #[serde(alias = "INT64")]
    Integer,
    #[serde(alias = "FLOAT64")]
    Float,
    String,
    Timestamp,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::String => "STRING",
            FieldType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nullability of a table field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
}

/// Schema column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    pub r#type: FieldType,

    #[serde(default)]
    pub mode: FieldMode,
}

impl Field {
    pub fn new(name: impl Into<String>, r#type: FieldType, mode: FieldMode) -> Self {
        Self {
            name: name.into(),
            r#type,
            mode,
        }
    }

    pub fn nullable(name: impl Into<String>, r#type: FieldType) -> Self {
        Self::new(name, r#type, FieldMode::Nullable)
    }
}

/// Stored cell value
///
/// The variant is chosen from the declared field type when the row is
/// inserted, never from the JSON type of the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// Floats print through `f64`'s Display, which is the shortest round-trip
// decimal without an exponent. Timestamps print as whole epoch seconds.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.timestamp()),
        }
    }
}

/// Stored table row, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Value of a column; absent columns read as `Null`
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Output of one query execution
///
/// Every cell is already stringified, the way the warehouse ships results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub schema: Vec<Field>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn new(schema: Vec<Field>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { schema, rows }
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}
