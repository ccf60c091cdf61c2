//! MySQL SQL dialect.
//!
//! MySQL differences:
//! - Backtick identifier quoting
//! - Anonymous `?` bind parameters
//! - `TEXT` columns cannot carry a UNIQUE index without a prefix length,
//!   so strings are `VARCHAR(255)`

use super::helpers;
use super::{identity_tokens, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_param(&self, _index: usize) -> String {
        "?".into()
    }

    fn emit_data_type(&self, dt: DataType) -> String {
        match dt {
            DataType::Integer => "BIGINT".into(),
            DataType::Real => "DOUBLE".into(),
            DataType::Text => "VARCHAR(255)".into(),
            DataType::Date => "DATE".into(),
        }
    }

    fn emit_identity(&self) -> TokenStream {
        identity_tokens("AUTO_INCREMENT")
    }
}
