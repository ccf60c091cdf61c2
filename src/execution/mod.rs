//! Execution adapter: runs a [`QueryPlan`] against storage and returns rows.
//!
//! - [`render`] - plan -> SQL, literal or parameter-bound
//! - [`sqlite`] - pooled SQLite backend with timeouts and bounded retry
//! - [`row`] - ordered result rows

pub mod error;
pub mod render;
pub mod row;
pub mod sqlite;

use async_trait::async_trait;

use crate::planner::QueryPlan;

pub use error::{ExecutionError, ExecutionResult};
pub use render::{render, render_bound, render_sql, BoundQuery};
pub use row::Row;
pub use sqlite::{memory_url, SqliteBackend};

/// Storage that can execute compiled plans.
///
/// Rows come back in select-list order with the plan's labels.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, plan: &QueryPlan) -> ExecutionResult<Vec<Row>>;
}
