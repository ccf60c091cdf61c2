//! Schema registry: the fixed star schema behind every query.
//!
//! One fact entity (`performance_metrics`) references three dimension
//! entities by surrogate id. The registry is built once and is read-only
//! afterwards; it feeds the field catalog, the join graph of every compiled
//! plan, and the DDL that materializes the tables.

use serde::Serialize;

use crate::sql::ddl::{ColumnDef, CreateIndex, CreateTable, DdlStatement};
use crate::sql::expr::{table_col, Expr, ExprExt};
use crate::sql::types::DataType;
use crate::sql::Dialect;

pub const PERFORMANCE_METRICS: &str = "performance_metrics";
pub const CHANNELS: &str = "channels";
pub const COUNTRIES: &str = "countries";
pub const OPERATING_SYSTEMS: &str = "operating_systems";

/// Name of the fact table's calendar column.
pub const DATE_COLUMN: &str = "date";

/// Surrogate key column shared by every entity.
pub const ID_COLUMN: &str = "id";

/// A column on a specific entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Qualified `table.column` expression.
    pub fn to_expr(&self) -> Expr {
        table_col(&self.table, &self.column)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    Fact,
    Dimension,
}

/// What a column is for. Only attributes and measures are user-visible fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnRole {
    /// Backend-assigned surrogate identifier.
    SurrogateKey,
    /// Reference to a dimension's surrogate key.
    ForeignKey { references: String },
    /// Descriptive value (dimension name, fact date).
    Attribute { unique: bool },
    /// Additive numeric measure.
    Measure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub role: ColumnRole,
}

impl Column {
    fn surrogate_key() -> Self {
        Self {
            name: ID_COLUMN.into(),
            data_type: DataType::Integer,
            role: ColumnRole::SurrogateKey,
        }
    }

    fn foreign_key(name: &str, references: &str) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Integer,
            role: ColumnRole::ForeignKey {
                references: references.into(),
            },
        }
    }

    fn attribute(name: &str, data_type: DataType, unique: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            role: ColumnRole::Attribute { unique },
        }
    }

    fn measure(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            role: ColumnRole::Measure,
        }
    }

    /// Surrogate and foreign keys are plumbing, not queryable fields.
    pub fn is_key(&self) -> bool {
        matches!(
            self.role,
            ColumnRole::SurrogateKey | ColumnRole::ForeignKey { .. }
        )
    }

    fn to_column_def(&self) -> ColumnDef {
        let def = ColumnDef::new(self.name.clone(), self.data_type);
        match &self.role {
            ColumnRole::SurrogateKey => def.primary_key().identity(),
            ColumnRole::ForeignKey { references } => {
                def.not_null().references(references.clone(), ID_COLUMN)
            }
            ColumnRole::Attribute { unique: true } => def.not_null().unique(),
            ColumnRole::Attribute { unique: false } | ColumnRole::Measure => def.not_null(),
        }
    }
}

/// A table of the star schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    pub role: EntityRole,
    pub columns: Vec<Column>,
}

impl Entity {
    fn dimension(name: &str, attribute: &str) -> Self {
        Self {
            name: name.into(),
            role: EntityRole::Dimension,
            columns: vec![
                Column::surrogate_key(),
                Column::attribute(attribute, DataType::Text, true),
            ],
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Non-key columns, in declaration order.
    pub fn field_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_key())
    }

    /// The single descriptive column of a dimension.
    pub fn attribute(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| matches!(c.role, ColumnRole::Attribute { .. }))
    }

    pub fn create_table(&self) -> CreateTable {
        self.columns
            .iter()
            .fold(CreateTable::new(self.name.clone()).if_not_exists(), |ct, c| {
                ct.column(c.to_column_def())
            })
    }
}

/// One edge of the join graph: `right.right_column = left.left_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinEdge {
    /// Entity already in the FROM clause (the fact table).
    pub left: String,
    /// Entity being joined in (a dimension).
    pub right: String,
    pub left_column: String,
    pub right_column: String,
}

impl JoinEdge {
    /// The equality join predicate.
    pub fn predicate(&self) -> Expr {
        table_col(&self.right, &self.right_column).eq(table_col(&self.left, &self.left_column))
    }
}

/// The star schema: one fact entity, its dimensions and the join graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarSchema {
    dimensions: Vec<Entity>,
    fact: Entity,
    joins: Vec<JoinEdge>,
}

impl StarSchema {
    /// The ad-performance schema: metrics by date, channel, country and OS.
    pub fn performance() -> Self {
        let dimensions = vec![
            Entity::dimension(CHANNELS, "channel"),
            Entity::dimension(COUNTRIES, "country"),
            Entity::dimension(OPERATING_SYSTEMS, "operating_system"),
        ];

        let mut columns = vec![
            Column::surrogate_key(),
            Column::attribute(DATE_COLUMN, DataType::Date, false),
        ];
        let mut joins = Vec::with_capacity(dimensions.len());
        for dim in &dimensions {
            let fk = foreign_key_name(dim);
            columns.push(Column::foreign_key(&fk, &dim.name));
            joins.push(JoinEdge {
                left: PERFORMANCE_METRICS.into(),
                right: dim.name.clone(),
                left_column: fk,
                right_column: ID_COLUMN.into(),
            });
        }
        columns.extend([
            Column::measure("impressions", DataType::Integer),
            Column::measure("clicks", DataType::Integer),
            Column::measure("installs", DataType::Integer),
            Column::measure("spend", DataType::Real),
            Column::measure("revenue", DataType::Real),
        ]);

        Self {
            dimensions,
            fact: Entity {
                name: PERFORMANCE_METRICS.into(),
                role: EntityRole::Fact,
                columns,
            },
            joins,
        }
    }

    pub fn fact(&self) -> &Entity {
        &self.fact
    }

    pub fn dimensions(&self) -> &[Entity] {
        &self.dimensions
    }

    /// Every entity, dimensions first (creation and catalog order).
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.dimensions.iter().chain(std::iter::once(&self.fact))
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities().find(|e| e.name == name)
    }

    /// Fact-to-dimension joins, applied to every plan regardless of the fields used.
    pub fn join_graph(&self) -> &[JoinEdge] {
        &self.joins
    }

    /// The join edge that brings `dimension` into the query.
    pub fn join_for(&self, dimension: &str) -> Option<&JoinEdge> {
        self.joins.iter().find(|j| j.right == dimension)
    }

    /// The fact table's date column.
    pub fn date_column(&self) -> ColumnRef {
        ColumnRef::new(&self.fact.name, DATE_COLUMN)
    }

    /// CREATE statements for every table plus the date index.
    pub fn ddl(&self) -> Vec<DdlStatement> {
        let mut stmts: Vec<DdlStatement> =
            self.entities().map(|e| e.create_table().into()).collect();
        stmts.push(
            CreateIndex::new(format!("idx_{}_{}", self.fact.name, DATE_COLUMN), &self.fact.name)
                .if_not_exists()
                .column(DATE_COLUMN)
                .into(),
        );
        stmts
    }

    /// The DDL rendered for `dialect`, one statement per entry.
    pub fn ddl_sql(&self, dialect: Dialect) -> Vec<String> {
        self.ddl().iter().map(|s| s.to_sql(dialect)).collect()
    }
}

impl Default for StarSchema {
    fn default() -> Self {
        Self::performance()
    }
}

/// `channels` -> `channel_id`, `operating_systems` -> `operating_system_id`.
fn foreign_key_name(dimension: &Entity) -> String {
    match dimension.attribute() {
        Some(attr) => format!("{}_{}", attr.name, ID_COLUMN),
        None => format!("{}_{}", dimension.name, ID_COLUMN),
    }
}
