//! INSERT support for the loader.
//!
//! Every insert the loader runs binds one parameter per column, so the
//! builder only knows that shape.
//!
//! ```ignore
//! use adlens::sql::dml::Insert;
//! use adlens::sql::Dialect;
//!
//! // INSERT INTO "channels" ("channel") VALUES (?1)
//! let insert = Insert::into("channels").parameterized(["channel"]);
//! println!("{}", insert.to_sql(Dialect::Sqlite));
//! ```

use super::dialect::Dialect;
use super::expr::param;
use super::token::{Token, TokenStream};

/// Single-row `INSERT INTO table (cols...) VALUES (params...)`.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
}

impl Insert {
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Set the columns; each gets the positional parameter matching its index.
    pub fn parameterized(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Insert)
            .space()
            .push(Token::Into)
            .space()
            .push(Token::Ident(self.table.clone()))
            .space()
            .lparen();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone()));
        }
        ts.rparen().space().push(Token::Values).space().lparen();
        for i in 1..=self.columns.len() {
            if i > 1 {
                ts.comma().space();
            }
            ts.append(&param(i).to_tokens());
        }
        ts.rparen();

        ts
    }
}
