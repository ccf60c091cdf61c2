//! Query plan types.
//!
//! A [`QueryPlan`] is the compiler's output: what to select and how, what to
//! group by, which predicates run before and after aggregation, how to order,
//! and which joins to apply. It is backend-neutral; `execution::render`
//! turns it into SQL.

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::schema::JoinEdge;
use crate::sql::SortDir;
use crate::value::Value;

/// A field as it appears in a plan: as computed per row, or summed per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "field", rename_all = "snake_case")]
pub enum Operand {
    Raw(CatalogEntry),
    Sum(CatalogEntry),
}

impl Operand {
    pub fn entry(&self) -> &CatalogEntry {
        match self {
            Operand::Raw(e) | Operand::Sum(e) => e,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Operand::Sum(_))
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Output label: the caller's field name.
    pub label: String,
    pub operand: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

/// `operand <op> value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub operand: Operand,
    pub op: Comparison,
    pub value: Value,
}

/// ORDER BY entry, bound to a select-list position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderKey {
    /// 1-based position in the select list.
    pub position: usize,
    /// Label of the projection at that position.
    pub label: String,
    #[serde(serialize_with = "serialize_dir")]
    pub direction: SortDir,
}

fn serialize_dir<S: serde::Serializer>(dir: &SortDir, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(match dir {
        SortDir::Asc => "asc",
        SortDir::Desc => "desc",
    })
}

/// A compiled aggregation query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub select: Vec<Projection>,
    /// Grouping fields, in select-list order. Empty when not grouping.
    pub group_by: Vec<CatalogEntry>,
    /// Row filters (WHERE), conjunctive.
    pub pre_filters: Vec<Predicate>,
    /// Group filters (HAVING), conjunctive.
    pub post_filters: Vec<Predicate>,
    pub order_by: Vec<OrderKey>,
    /// Fact table every join hangs off.
    pub from: String,
    pub joins: Vec<JoinEdge>,
}

impl QueryPlan {
    /// Whether any projection is aggregated.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty() || self.select.iter().any(|p| p.operand.is_aggregate())
    }

    /// Output labels, in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.select.iter().map(|p| p.label.as_str())
    }
}
