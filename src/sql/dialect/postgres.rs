//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - `$N` bind parameters
//! - Identity columns via `GENERATED BY DEFAULT AS IDENTITY`

use super::helpers;
use super::{identity_tokens, SqlDialect};
use crate::sql::token::TokenStream;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_param(&self, index: usize) -> String {
        format!("${}", index)
    }

    // Uses default emit_data_type (BIGINT / DOUBLE PRECISION / TEXT / DATE)

    fn emit_identity(&self) -> TokenStream {
        identity_tokens("GENERATED BY DEFAULT AS IDENTITY")
    }
}
