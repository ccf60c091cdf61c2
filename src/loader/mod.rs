//! Database bootstrap: schema creation and CSV sample-data ingestion.
//!
//! Each distinct dimension value is inserted once and its id remembered
//! for the rest of the load; dimension rows are never updated. A whole
//! file loads in one transaction, so a bad record leaves the database as
//! it was.

mod record;

pub use record::CsvRecord;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::execution::{ExecutionError, SqliteBackend};
use crate::schema::{ColumnRole, Entity, StarSchema, ID_COLUMN};
use crate::sql::{table_col, Dialect, Insert, Query};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("invalid record at line {line}: {detail}")]
    InvalidRecord { line: u64, detail: String },

    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// What a load inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// CSV records read.
    pub records: usize,
    /// New rows per table.
    pub inserted: BTreeMap<String, usize>,
}

impl LoadReport {
    pub fn inserted(&self, table: &str) -> usize {
        self.inserted.get(table).copied().unwrap_or(0)
    }
}

/// Create every table and index that does not exist yet.
pub fn create_schema(conn: &Connection, schema: &StarSchema) -> LoadResult<()> {
    for sql in schema.ddl_sql(Dialect::Sqlite) {
        debug!(sql = %sql, "ddl");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

/// Load CSV records from `reader` in a single transaction.
pub fn load_csv<R: Read>(
    conn: &mut Connection,
    schema: &StarSchema,
    reader: R,
) -> LoadResult<LoadReport> {
    let started = Instant::now();
    let tx = conn.transaction()?;
    let mut ids = DimensionIds::seed(&tx, schema)?;
    let mut report = LoadReport::default();

    let fact = schema.fact();
    let fact_columns: Vec<&str> = fact
        .columns
        .iter()
        .filter(|c| c.role != ColumnRole::SurrogateKey)
        .map(|c| c.name.as_str())
        .collect();
    let fact_insert = Insert::into(fact.name.clone())
        .parameterized(fact_columns.iter().copied())
        .to_sql(Dialect::Sqlite);

    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv
        .headers()
        .map_err(|source| LoadError::Csv { line: 1, source })?
        .clone();

    let mut raw = csv::StringRecord::new();
    loop {
        let line = csv.position().line();
        let more = csv
            .read_record(&mut raw)
            .map_err(|source| LoadError::Csv { line, source })?;
        if !more {
            break;
        }
        let line = raw.position().map(|p| p.line()).unwrap_or(line);

        let record: CsvRecord = raw
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Csv { line, source })?;
        record
            .validate()
            .map_err(|detail| LoadError::InvalidRecord { line, detail })?;

        let mut values = Vec::with_capacity(fact_columns.len());
        for column in fact.columns.iter().filter(|c| c.role != ColumnRole::SurrogateKey) {
            let value = match &column.role {
                ColumnRole::ForeignKey { references } => {
                    let attribute = record.dimension_value(references).ok_or_else(|| {
                        LoadError::InvalidRecord {
                            line,
                            detail: format!("no value for dimension {}", references),
                        }
                    })?;
                    Value::Integer(ids.resolve(&tx, schema, references, attribute, &mut report)?)
                }
                _ => record.fact_value(&column.name).ok_or_else(|| {
                    LoadError::InvalidRecord {
                        line,
                        detail: format!("no value for column {}", column.name),
                    }
                })?,
            };
            values.push(value);
        }

        tx.prepare_cached(&fact_insert)?
            .execute(params_from_iter(values.iter()))?;
        *report.inserted.entry(fact.name.clone()).or_default() += 1;
        report.records += 1;
    }

    tx.commit()?;
    info!(
        records = report.records,
        inserted = ?report.inserted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "sample data loaded"
    );
    Ok(report)
}

/// Load a CSV file from disk.
pub fn load_csv_file(
    conn: &mut Connection,
    schema: &StarSchema,
    path: &Path,
) -> LoadResult<LoadReport> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_csv(conn, schema, file)
}

/// Create the schema on a pooled database and optionally load a CSV file.
pub async fn bootstrap(
    backend: &SqliteBackend,
    schema: &StarSchema,
    sample_csv: Option<PathBuf>,
) -> LoadResult<LoadReport> {
    let schema = schema.clone();
    backend
        .interact(move |conn| {
            Ok(create_schema(conn, &schema).and_then(|()| match &sample_csv {
                Some(path) => load_csv_file(conn, &schema, path),
                None => Ok(LoadReport::default()),
            }))
        })
        .await?
}

/// attribute value -> surrogate id, per dimension table.
struct DimensionIds {
    ids: HashMap<String, HashMap<String, i64>>,
}

impl DimensionIds {
    /// Start from the rows already stored so reloads reuse existing ids.
    fn seed(conn: &Connection, schema: &StarSchema) -> LoadResult<Self> {
        let mut ids = HashMap::new();
        for dim in schema.dimensions() {
            let Some(attribute) = dim.attribute() else {
                continue;
            };
            let sql = Query::new()
                .select(vec![
                    table_col(&dim.name, ID_COLUMN),
                    table_col(&dim.name, &attribute.name),
                ])
                .from(dim.name.as_str())
                .to_sql(Dialect::Sqlite);

            let mut stmt = conn.prepare(&sql)?;
            let known = stmt
                .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))?
                .collect::<Result<HashMap<_, _>, _>>()?;
            ids.insert(dim.name.clone(), known);
        }
        Ok(Self { ids })
    }

    fn resolve(
        &mut self,
        conn: &Connection,
        schema: &StarSchema,
        table: &str,
        value: &str,
        report: &mut LoadReport,
    ) -> LoadResult<i64> {
        let known = self.ids.entry(table.to_string()).or_default();
        if let Some(&id) = known.get(value) {
            return Ok(id);
        }

        let attribute = schema
            .entity(table)
            .and_then(Entity::attribute)
            .map(|c| c.name.clone())
            .ok_or_else(|| LoadError::InvalidRecord {
                line: 0,
                detail: format!("{} has no attribute column", table),
            })?;
        let sql = Insert::into(table)
            .parameterized([attribute])
            .to_sql(Dialect::Sqlite);
        conn.prepare_cached(&sql)?.execute([value])?;

        let id = conn.last_insert_rowid();
        known.insert(value.to_string(), id);
        *report.inserted.entry(table.to_string()).or_default() += 1;
        Ok(id)
    }
}
