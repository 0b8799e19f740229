use std::fmt;

use serde::Serialize;

/// Inferred data type of a column. The widening order is
/// Integer ⊂ Float ⊂ String: mixing integers and floats promotes to Float,
/// mixing anything with a non-numeric token forces String.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Unknown,
    String,
    #[serde(rename = "int")]
    Integer,
    Float,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Unknown => "unknown",
            ColumnType::String => "string",
            ColumnType::Integer => "int",
            ColumnType::Float => "float",
        };
        write!(f, "{name}")
    }
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

/// A single typed cell value. Nulls are represented as `Option::None`
/// wherever a value may be absent, never as a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    /// Canonical textual representation, used when a non-string value lands
    /// in a categorical column.
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A named, typed column. Position within the column list is significant and
/// matches the value order of every row produced by the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub datatype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: ColumnType) -> Self {
        Self {
            name: name.into(),
            datatype,
        }
    }
}

/// One decoded row: same length and order as the stream's column list.
pub type Row = Vec<Option<Value>>;
