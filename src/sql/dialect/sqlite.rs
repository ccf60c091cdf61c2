//! SQLite SQL dialect.
//!
//! SQLite is the executing backend:
//! - ANSI identifier quoting (`"`)
//! - Dates stored as ISO-8601 text, so date literals are plain strings
//! - `INTEGER PRIMARY KEY` aliases the rowid and auto-assigns ids

use super::helpers;
use super::SqlDialect;
use crate::sql::types::DataType;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_date_literal(&self, date: &str) -> String {
        helpers::quote_string_single(date)
    }

    fn format_param(&self, index: usize) -> String {
        format!("?{}", index)
    }

    fn emit_data_type(&self, dt: DataType) -> String {
        match dt {
            // Must be exactly INTEGER for the rowid alias to apply.
            DataType::Integer => "INTEGER".into(),
            DataType::Real => "REAL".into(),
            DataType::Text | DataType::Date => "TEXT".into(),
        }
    }
}
