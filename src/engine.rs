//! Engine façade: schema, catalog, compiler and backend wired together.
//!
//! ```text
//! wire params → QueryRequest → QueryPlan → SQL → rows
//! ```
//!
//! # Example
//!
//! ```ignore
//! use adlens::prelude::*;
//!
//! let engine = Engine::from_settings(&Settings::load()?).await?;
//! let request = QueryRequest::new("channel,clicks")
//!     .group("channel")
//!     .order("-clicks");
//! for row in engine.run(&request).await? {
//!     println!("{}", serde_json::to_string(&row)?);
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::catalog::FieldCatalog;
use crate::config::Settings;
use crate::error::Result;
use crate::execution::{render_sql, Backend, Row, SqliteBackend};
use crate::loader::{self, LoadReport};
use crate::planner::{QueryCompiler, QueryPlan};
use crate::request::QueryRequest;
use crate::schema::StarSchema;
use crate::sql::Dialect;

/// Shared, read-only query engine. Cheap to share behind an `Arc`.
pub struct Engine {
    schema: StarSchema,
    catalog: FieldCatalog,
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("fields", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(schema: StarSchema, backend: Arc<dyn Backend>) -> Self {
        let catalog = FieldCatalog::from_schema(&schema);
        Self {
            schema,
            catalog,
            backend,
        }
    }

    /// Open the configured database and, when enabled, create the schema and
    /// load the sample CSV.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let (engine, _) = Self::bootstrap(settings).await?;
        Ok(engine)
    }

    /// Like [`Engine::from_settings`], also returning what was loaded.
    pub async fn bootstrap(settings: &Settings) -> Result<(Self, Option<LoadReport>)> {
        let schema = StarSchema::performance();
        let url = settings.database.resolved_url()?;
        let backend = SqliteBackend::open(url, &settings.database)?;

        let report = if settings.data.load_on_start {
            let csv = settings.data.resolved_sample_csv()?;
            let report = loader::bootstrap(&backend, &schema, csv).await?;
            info!(records = report.records, "database bootstrapped");
            Some(report)
        } else {
            None
        };

        Ok((Self::new(schema, Arc::new(backend)), report))
    }

    pub fn schema(&self) -> &StarSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Validate wire parameters against the catalog.
    pub fn parse_request<I, K, V>(&self, params: I) -> Result<QueryRequest>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(QueryRequest::from_params(params, &self.catalog)?)
    }

    pub fn compile(&self, request: &QueryRequest) -> Result<QueryPlan> {
        Ok(QueryCompiler::new(&self.schema, &self.catalog).compile(request)?)
    }

    /// The SQL a request compiles to, with filter values inlined.
    pub fn sql(&self, request: &QueryRequest, dialect: Dialect) -> Result<String> {
        Ok(render_sql(&self.compile(request)?, dialect))
    }

    /// Compile and execute. Nothing reaches the backend unless compilation succeeds.
    pub async fn run(&self, request: &QueryRequest) -> Result<Vec<Row>> {
        let plan = self.compile(request)?;
        Ok(self.backend.execute(&plan).await?)
    }
}
