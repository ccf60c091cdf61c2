//! Plan -> SQL rendering.
//!
//! Every column is table-qualified and every output aliased with its
//! label. ORDER BY refers to select-list positions. Filter values are
//! either inlined as literals (for display) or bound as positional
//! parameters (for execution).

use tracing::debug;

use crate::planner::{Comparison, Operand, Predicate, QueryPlan};
use crate::sql::expr::{lit_date, lit_float, lit_int, lit_null, lit_str, param, sum};
use crate::sql::{Dialect, Expr, ExprExt, OrderByExpr, Query, SelectExpr, SortDir};
use crate::value::{Value, DATE_FORMAT};

/// A query with its bind parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub query: Query,
    pub params: Vec<Value>,
}

impl BoundQuery {
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.query.to_sql(dialect)
    }
}

/// Render with filter values inlined as literals.
pub fn render(plan: &QueryPlan) -> Query {
    Renderer::literal().query(plan)
}

/// Render with filter values as `?N`-style placeholders.
pub fn render_bound(plan: &QueryPlan) -> BoundQuery {
    let mut renderer = Renderer::bound();
    let query = renderer.query(plan);
    BoundQuery {
        query,
        params: renderer.params,
    }
}

/// Literal SQL text for `dialect`.
pub fn render_sql(plan: &QueryPlan, dialect: Dialect) -> String {
    let sql = render(plan).to_sql(dialect);
    debug!(%dialect, sql = %sql, "rendered query plan");
    sql
}

pub fn operand_expr(operand: &Operand) -> Expr {
    match operand {
        Operand::Raw(entry) => entry.to_expr(),
        Operand::Sum(entry) => sum(entry.to_expr()),
    }
}

pub fn literal_expr(value: &Value) -> Expr {
    match value {
        Value::Null => lit_null(),
        Value::Integer(n) => lit_int(*n),
        Value::Real(x) => lit_float(*x),
        Value::Text(s) => lit_str(s),
        Value::Date(d) => lit_date(&d.format(DATE_FORMAT).to_string()),
    }
}

struct Renderer {
    bind: bool,
    params: Vec<Value>,
}

impl Renderer {
    fn literal() -> Self {
        Self {
            bind: false,
            params: Vec::new(),
        }
    }

    fn bound() -> Self {
        Self {
            bind: true,
            params: Vec::new(),
        }
    }

    fn value(&mut self, value: &Value) -> Expr {
        if self.bind {
            self.params.push(value.clone());
            param(self.params.len())
        } else {
            literal_expr(value)
        }
    }

    fn predicate(&mut self, predicate: &Predicate) -> Expr {
        let lhs = operand_expr(&predicate.operand);
        let rhs = self.value(&predicate.value);
        match predicate.op {
            Comparison::Eq => lhs.eq(rhs),
            Comparison::Gte => lhs.gte(rhs),
            Comparison::Lte => lhs.lte(rhs),
        }
    }

    fn query(&mut self, plan: &QueryPlan) -> Query {
        let select: Vec<SelectExpr> = plan
            .select
            .iter()
            .map(|p| operand_expr(&p.operand).alias(&p.label))
            .collect();

        let mut query = Query::new().select(select).from(plan.from.as_str());

        for edge in &plan.joins {
            query = query.inner_join(edge.right.as_str(), edge.predicate());
        }

        // WHERE placeholders come before HAVING ones, matching clause order.
        for predicate in &plan.pre_filters {
            query = query.filter(self.predicate(predicate));
        }

        query = query.group_by(plan.group_by.iter().map(|e| e.to_expr()).collect());

        for predicate in &plan.post_filters {
            query = query.having(self.predicate(predicate));
        }

        query.order_by(
            plan.order_by
                .iter()
                .map(|key| {
                    let position = lit_int(key.position as i64);
                    match key.direction {
                        SortDir::Asc => OrderByExpr::asc(position),
                        SortDir::Desc => OrderByExpr::desc(position),
                    }
                })
                .collect(),
        )
    }
}
