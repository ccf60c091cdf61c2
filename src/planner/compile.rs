//! Request -> plan compilation.
//!
//! ```text
//! QueryRequest → split lists → resolve names → select/group → order → filters → QueryPlan
//! ```
//!
//! The compiler is pure: it reads the shared [`StarSchema`] and
//! [`FieldCatalog`] and never touches a database.

use tracing::debug;

use crate::catalog::{CatalogEntry, FieldCatalog, DATE_FIELD};
use crate::request::QueryRequest;
use crate::schema::StarSchema;
use crate::value::Value;

use super::error::{Clause, PlanError, PlanResult};
use super::order::{parse_order_spec, split_list};
use super::plan::{Comparison, Operand, OrderKey, Predicate, Projection, QueryPlan};

/// Compiles validated requests against one schema and catalog.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    schema: &'a StarSchema,
    catalog: &'a FieldCatalog,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a StarSchema, catalog: &'a FieldCatalog) -> Self {
        Self { schema, catalog }
    }

    pub fn compile(&self, request: &QueryRequest) -> PlanResult<QueryPlan> {
        // ====================================================================
        // Names
        // ====================================================================

        let fields = split_list(&request.fields);
        if fields.is_empty() {
            return Err(PlanError::EmptySelect);
        }
        let selected = fields
            .iter()
            .map(|name| self.resolve(name, Clause::Fields))
            .collect::<PlanResult<Vec<_>>>()?;

        let group: Vec<String> = request
            .group
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        for name in &group {
            self.resolve(name, Clause::Group)?;
        }
        let grouping = !group.is_empty();
        let is_grouped = |name: &str| group.iter().any(|g| g == name);

        // ====================================================================
        // Select list and GROUP BY
        // ====================================================================

        let mut select = Vec::with_capacity(selected.len());
        let mut group_by: Vec<CatalogEntry> = Vec::new();
        for entry in selected {
            let operand = if !grouping {
                Operand::Raw(entry.clone())
            } else if is_grouped(&entry.name) {
                if !group_by.iter().any(|g| g.name == entry.name) {
                    group_by.push(entry.clone());
                }
                Operand::Raw(entry.clone())
            } else {
                Operand::Sum(entry.clone())
            };
            select.push(Projection {
                label: entry.name.clone(),
                operand,
            });
        }

        // ====================================================================
        // ORDER BY
        // ====================================================================

        let mut order_by = Vec::new();
        if let Some(spec) = request.order.as_deref() {
            for term in parse_order_spec(spec) {
                self.resolve(&term.field, Clause::Order)?;
                let index = fields
                    .iter()
                    .position(|f| *f == term.field)
                    .ok_or_else(|| PlanError::Unorderable {
                        field: term.field.clone(),
                    })?;
                order_by.push(OrderKey {
                    position: index + 1,
                    label: term.field,
                    direction: term.direction,
                });
            }
        }

        // ====================================================================
        // WHERE / HAVING
        // ====================================================================

        let mut pre_filters = Vec::new();
        let mut post_filters = Vec::new();

        let bounds = [
            (request.date_from, Comparison::Gte),
            (request.date_to, Comparison::Lte),
        ];
        for (date, op) in bounds {
            if let Some(date) = date {
                let entry = self.resolve(DATE_FIELD, Clause::Filter)?;
                pre_filters.push(Predicate {
                    operand: Operand::Raw(entry.clone()),
                    op,
                    value: Value::Date(date),
                });
            }
        }

        for (name, value) in &request.filters {
            let entry = self.resolve(name, Clause::Filter)?;
            let after_grouping =
                grouping && !is_grouped(name) && fields.iter().any(|f| f == name);
            if after_grouping {
                post_filters.push(Predicate {
                    operand: Operand::Sum(entry.clone()),
                    op: Comparison::Eq,
                    value: value.clone(),
                });
            } else {
                pre_filters.push(Predicate {
                    operand: Operand::Raw(entry.clone()),
                    op: Comparison::Eq,
                    value: value.clone(),
                });
            }
        }

        let plan = QueryPlan {
            select,
            group_by,
            pre_filters,
            post_filters,
            order_by,
            from: self.schema.fact().name.clone(),
            joins: self.schema.join_graph().to_vec(),
        };

        debug!(
            fields = %request.fields,
            grouped = plan.is_grouped(),
            where_terms = plan.pre_filters.len(),
            having_terms = plan.post_filters.len(),
            order_terms = plan.order_by.len(),
            "compiled query plan"
        );

        Ok(plan)
    }

    fn resolve(&self, name: &str, clause: Clause) -> PlanResult<&'a CatalogEntry> {
        self.catalog
            .resolve(name)
            .map_err(|_| PlanError::UnknownField {
                field: name.to_string(),
                clause,
            })
    }
}
