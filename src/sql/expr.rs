//! Expression AST for the star-schema queries.
//!
//! Only the shapes the compiler and loader emit exist here: qualified
//! columns, literals, bind parameters, comparisons joined by AND, the
//! guarded ratio (`CASE WHEN ... THEN ... ELSE ... END` over a division)
//! and `SUM`.

use super::query::SelectExpr;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `table.column`
    Column { table: String, column: String },

    Literal(Literal),

    /// Positional bind parameter (1-based)
    Param(usize),

    /// `left op right`
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// `SUM(expr)`
    Sum(Box<Expr>),

    /// Single-branch `CASE WHEN condition THEN then ELSE otherwise END`
    Case {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    /// ISO `YYYY-MM-DD`; each dialect decides how a date literal is spelled.
    Date(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Gte,
    Lte,
    And,
    Div,
}

/// Sort direction (shared with query ORDER BY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Tokens stay dialect-agnostic until serialized.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                ts.push(Token::Ident(table.clone()))
                    .push(Token::Dot)
                    .push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Date(d) => Token::LitDate(d.clone()),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::Param(n) => {
                ts.push(Token::Param(*n));
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens())
                    .space()
                    .push(match op {
                        BinaryOperator::Eq => Token::Eq,
                        BinaryOperator::Gte => Token::Gte,
                        BinaryOperator::Lte => Token::Lte,
                        BinaryOperator::And => Token::And,
                        BinaryOperator::Div => Token::Div,
                    })
                    .space()
                    .append(&right.to_tokens());
            }

            Expr::Sum(arg) => {
                ts.push(Token::Sum).lparen().append(&arg.to_tokens()).rparen();
            }

            Expr::Case {
                condition,
                then,
                otherwise,
            } => {
                ts.push(Token::Case).space().push(Token::When).space();
                ts.append(&condition.to_tokens());
                ts.space().push(Token::Then).space();
                ts.append(&then.to_tokens());
                ts.space().push(Token::Else).space();
                ts.append(&otherwise.to_tokens());
                ts.space().push(Token::End);
            }
        }

        ts
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: table.into(),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Date literal from an ISO `YYYY-MM-DD` string.
pub fn lit_date(iso: &str) -> Expr {
    Expr::Literal(Literal::Date(iso.into()))
}

pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn param(index: usize) -> Expr {
    Expr::Param(index)
}

pub fn sum(expr: Expr) -> Expr {
    Expr::Sum(Box::new(expr))
}

/// `CASE WHEN cond THEN then ELSE otherwise END`
pub fn case_when(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::Case {
        condition: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    }
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gte, other)
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Lte, other)
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn div(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Div, other)
    }

    /// Alias this expression (for SELECT list).
    fn alias(self, name: &str) -> SelectExpr {
        SelectExpr {
            expr: self.into_expr(),
            alias: Some(name.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit_int(n as i64)
    }
}
