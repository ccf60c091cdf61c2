//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`ddl`] - CREATE TABLE / CREATE INDEX
//! - [`dml`] - INSERT
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_when, lit_date, lit_float, lit_int, lit_null, lit_str, param, sum, table_col,
    BinaryOperator, Expr, ExprExt, Literal, SortDir,
};
pub use query::{Join, OrderByExpr, Query, SelectExpr};
pub use token::{Token, TokenStream};
pub use types::DataType;

pub use ddl::{ColumnConstraint, ColumnDef, CreateIndex, CreateTable, DdlStatement};
pub use dml::Insert;
