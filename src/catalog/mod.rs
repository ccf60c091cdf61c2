//! Field catalog: logical field names resolved to column or derived expressions.
//!
//! Built once from the [`StarSchema`] (every non-key column of every entity)
//! plus the derived `cpi` metric, then shared read-only.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::schema::{ColumnRef, ColumnRole, StarSchema};
use crate::sql::expr::{case_when, Expr, ExprExt};
use crate::sql::types::DataType;

/// Cost per install: spend / installs, or spend itself when there are no installs.
pub const CPI_FIELD: &str = "cpi";

/// Field names that address the date column.
pub const DATE_FIELD: &str = "date";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no such field: {field}")]
    UnknownField { field: String },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// How a field is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldExpr {
    /// A stored column.
    Column(ColumnRef),
    /// `CASE WHEN denominator = 0 THEN numerator ELSE numerator / denominator END`
    GuardedRatio {
        numerator: ColumnRef,
        denominator: ColumnRef,
    },
}

impl FieldExpr {
    /// SQL expression computing the field for one fact row.
    pub fn to_expr(&self) -> Expr {
        match self {
            FieldExpr::Column(col) => col.to_expr(),
            FieldExpr::GuardedRatio {
                numerator,
                denominator,
            } => case_when(
                denominator.to_expr().eq(0),
                numerator.to_expr(),
                numerator.to_expr().div(denominator.to_expr()),
            ),
        }
    }

    pub fn is_derived(&self) -> bool {
        !matches!(self, FieldExpr::Column(_))
    }
}

/// User-facing classification, used for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Attribute,
    Measure,
    Derived,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldKind::Attribute => "attribute",
            FieldKind::Measure => "measure",
            FieldKind::Derived => "derived",
        })
    }
}

/// One resolvable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: FieldKind,
    pub data_type: DataType,
    pub expr: FieldExpr,
}

impl CatalogEntry {
    pub fn to_expr(&self) -> Expr {
        self.expr.to_expr()
    }
}

/// Immutable name -> entry map, in schema declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl FieldCatalog {
    /// Scan every entity's non-key columns, then add the derived rules.
    ///
    /// A later entity never shadows an earlier field of the same name.
    pub fn from_schema(schema: &StarSchema) -> Self {
        let mut catalog = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };

        for entity in schema.entities() {
            for column in entity.field_columns() {
                let kind = match column.role {
                    ColumnRole::Measure => FieldKind::Measure,
                    _ => FieldKind::Attribute,
                };
                catalog.insert(CatalogEntry {
                    name: column.name.clone(),
                    kind,
                    data_type: column.data_type,
                    expr: FieldExpr::Column(ColumnRef::new(&entity.name, &column.name)),
                });
            }
        }

        let fact = &schema.fact().name;
        catalog.insert(CatalogEntry {
            name: CPI_FIELD.into(),
            kind: FieldKind::Derived,
            data_type: DataType::Real,
            expr: FieldExpr::GuardedRatio {
                numerator: ColumnRef::new(fact, "spend"),
                denominator: ColumnRef::new(fact, "installs"),
            },
        });

        catalog
    }

    fn insert(&mut self, entry: CatalogEntry) {
        if self.index.contains_key(&entry.name) {
            return;
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Look up a field by exact name.
    pub fn resolve(&self, name: &str) -> ResolveResult<&CatalogEntry> {
        self.get(name).ok_or_else(|| ResolveError::UnknownField {
            field: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
