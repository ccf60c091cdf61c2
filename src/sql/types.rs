//! Column data types shared by the schema registry and DDL generation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage type of a column.
///
/// The star schema only needs four scalar kinds; each dialect maps them to
/// its own type names in `SqlDialect::emit_data_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer.
    Integer,
    /// Double-precision float.
    Real,
    /// Variable-length string.
    Text,
    /// Calendar date without time.
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Text => "text",
            DataType::Date => "date",
        };
        f.write_str(name)
    }
}
