//! # adlens
//!
//! Ad-performance analytics: compiles declarative metric requests into
//! grouped, filtered SQL over a star schema and runs them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        wire params (fields, group, order, dates, ...)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [request]
//! ┌─────────────────────────────────────────────────────────┐
//! │              QueryRequest (validated, typed)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner + catalog + schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │      QueryPlan (select / group / where / having / order) │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [execution]
//! ┌─────────────────────────────────────────────────────────┐
//! │          SQL (SQLite, PostgreSQL, MySQL) → rows          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod loader;
pub mod planner;
pub mod request;
pub mod schema;
pub mod sql;
pub mod value;

#[cfg(feature = "server")]
pub mod web;

pub use engine::Engine;
pub use error::{Error, ErrorKind, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{CatalogEntry, FieldCatalog, FieldKind};
    pub use crate::config::Settings;
    pub use crate::engine::Engine;
    pub use crate::error::{Error, ErrorKind};
    pub use crate::execution::{Backend, Row, SqliteBackend};
    pub use crate::planner::{QueryCompiler, QueryPlan};
    pub use crate::request::QueryRequest;
    pub use crate::schema::StarSchema;
    pub use crate::sql::{Dialect, SortDir};
    pub use crate::value::Value;
}
