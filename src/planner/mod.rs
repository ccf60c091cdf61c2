//! Query planner: validated request -> [`QueryPlan`].
//!
//! Field names are resolved through the catalog, fields outside the group
//! list are summed when grouping, sort entries bind to select-list
//! positions, and each equality filter lands in WHERE or HAVING depending
//! on whether it constrains a summed output.

pub mod compile;
pub mod error;
pub mod order;
pub mod plan;

pub use compile::QueryCompiler;
pub use error::{Clause, PlanError, PlanResult};
pub use order::{parse_order_entry, parse_order_spec, split_list, OrderTerm};
pub use plan::{Comparison, Operand, OrderKey, Predicate, Projection, QueryPlan};
