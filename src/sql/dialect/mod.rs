//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (SQLite/PG), `` ` `` (MySQL)
//! - Date literals: `'YYYY-MM-DD'` (SQLite text dates) vs `DATE 'YYYY-MM-DD'`
//! - Bind parameters: `?N` vs `$N` vs `?`
//! - Column types and identity columns for DDL
//!
//! # Usage
//!
//! ```ignore
//! use adlens::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("channel");  // "channel"
//! ```

pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use super::token::{Token, TokenStream};
use super::types::DataType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All supported dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a date literal from its ISO `YYYY-MM-DD` form.
    ///
    /// - ANSI/PostgreSQL/MySQL: `DATE 'YYYY-MM-DD'`
    /// - SQLite: `'YYYY-MM-DD'` (dates are stored as ISO text)
    fn format_date_literal(&self, date: &str) -> String {
        format!("DATE {}", helpers::quote_string_single(date))
    }

    /// Format a positional bind parameter (1-based).
    fn format_param(&self, index: usize) -> String;

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Emit a column type for this dialect.
    fn emit_data_type(&self, dt: DataType) -> String {
        match dt {
            DataType::Integer => "BIGINT".into(),
            DataType::Real => "DOUBLE PRECISION".into(),
            DataType::Text => "TEXT".into(),
            DataType::Date => "DATE".into(),
        }
    }

    /// Emit the identity / auto-increment suffix for a surrogate key column.
    ///
    /// Empty when the dialect derives identity from the primary key itself.
    fn emit_identity(&self) -> TokenStream {
        TokenStream::new()
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.dialect().format_date_literal(date)
    }

    fn format_param(&self, index: usize) -> String {
        self.dialect().format_param(index)
    }

    fn emit_data_type(&self, dt: DataType) -> String {
        self.dialect().emit_data_type(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        self.dialect().emit_identity()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

/// Emit the identity suffix as a raw keyword fragment.
pub(crate) fn identity_tokens(keyword: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw(keyword.into()));
    ts
}
