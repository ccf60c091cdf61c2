//! Pooled SQLite backend.
//!
//! Connections come from a `deadpool-sqlite` pool and run on the blocking
//! thread pool through `interact`. Each statement is bounded by the
//! configured timeout; on expiry the running statement is interrupted so
//! its connection goes back to the pool promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_sqlite::{Config, Pool, PoolConfig, Runtime};
use rusqlite::types::ValueRef;
use rusqlite::InterruptHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::planner::{Operand, QueryPlan};
use crate::sql::types::DataType;
use crate::sql::Dialect;
use crate::value::{Value, DATE_FORMAT};

use super::error::{ExecutionError, ExecutionResult};
use super::render::render_bound;
use super::row::Row;
use super::Backend;

/// How a result column is decoded.
#[derive(Debug, Clone)]
struct ColumnSpec {
    label: String,
    /// Dates come back as ISO text and are parsed back into dates.
    date: bool,
}

pub struct SqliteBackend {
    pool: Pool,
    url: String,
    timeout: Duration,
    busy_timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    /// Holds a shared-cache in-memory database open between pool checkouts.
    _keepalive: Option<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// A fresh shared-cache in-memory database URI, unique per call.
pub fn memory_url() -> String {
    format!(
        "file:adlens-{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    )
}

impl SqliteBackend {
    /// Open a pool on `url`, or on a private in-memory database when `None`.
    pub fn open(url: Option<String>, settings: &DatabaseSettings) -> ExecutionResult<Self> {
        let url = url.unwrap_or_else(memory_url);

        let mut pool_config = PoolConfig::new(settings.pool_size);
        pool_config.timeouts.wait = Some(settings.query_timeout());
        let mut config = Config::new(url.clone());
        config.pool = Some(pool_config);
        let pool = config.create_pool(Runtime::Tokio1)?;

        let keepalive = if is_memory_url(&url) {
            Some(Mutex::new(rusqlite::Connection::open(&url)?))
        } else {
            None
        };

        info!(url = %url, pool_size = settings.pool_size, "sqlite backend ready");

        Ok(Self {
            pool,
            url,
            timeout: settings.query_timeout(),
            busy_timeout: settings.busy_timeout(),
            max_retries: settings.max_retries,
            backoff: settings.retry_backoff(),
            _keepalive: keepalive,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run a closure on a pooled connection.
    pub async fn interact<F, R>(&self, f: F) -> ExecutionResult<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> ExecutionResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.pool.get().await?;
        conn.interact(f)
            .await
            .map_err(|e| ExecutionError::Interact {
                detail: e.to_string(),
            })?
    }

    async fn run_once(
        &self,
        sql: Arc<str>,
        params: Arc<[Value]>,
        columns: Arc<[ColumnSpec]>,
    ) -> ExecutionResult<Vec<Row>> {
        let conn = self.pool.get().await?;
        let cancel = Arc::new(Cancellation::new(self.timeout));
        let guard = Arc::clone(&cancel);
        let busy_timeout = self.busy_timeout;

        let work = conn.interact(move |conn| {
            // Lock waits must end before the deadline so BUSY reaches the retry loop.
            conn.busy_timeout(busy_timeout)?;
            guard.arm(conn)?;
            query_rows(conn, &sql, &params, &columns)
        });

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result.map_err(|e| ExecutionError::Interact {
                detail: e.to_string(),
            })?,
            Err(_) => {
                cancel.cancel();
                Err(ExecutionError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }
}

/// Hand-off between the deadline on the async side and the statement
/// running on the blocking pool.
///
/// Either side may go first: a cancel before `arm` makes `arm` fail, a
/// cancel after it interrupts the published handle.
struct Cancellation {
    handle: Mutex<Option<InterruptHandle>>,
    cancelled: AtomicBool,
    after: Duration,
}

impl Cancellation {
    fn new(after: Duration) -> Self {
        Self {
            handle: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            after,
        }
    }

    /// Publish the connection's interrupt handle, unless already cancelled.
    fn arm(&self, conn: &rusqlite::Connection) -> ExecutionResult<()> {
        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(conn.get_interrupt_handle());
        }
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(ExecutionError::Timeout { after: self.after });
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(slot) = self.handle.lock() {
            if let Some(handle) = slot.as_ref() {
                handle.interrupt();
            }
        }
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn execute(&self, plan: &QueryPlan) -> ExecutionResult<Vec<Row>> {
        let bound = render_bound(plan);
        let sql: Arc<str> = bound.to_sql(Dialect::Sqlite).into();
        let params: Arc<[Value]> = bound.params.into();
        let columns: Arc<[ColumnSpec]> = plan
            .select
            .iter()
            .map(|p| ColumnSpec {
                label: p.label.clone(),
                date: matches!(&p.operand, Operand::Raw(e) if e.data_type == DataType::Date),
            })
            .collect();

        let started = Instant::now();
        let mut attempt = 0;
        loop {
            let result = self
                .run_once(Arc::clone(&sql), Arc::clone(&params), Arc::clone(&columns))
                .await;

            match result {
                Ok(rows) => {
                    info!(
                        rows = rows.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        attempts = attempt + 1,
                        "query executed"
                    );
                    return Ok(rows);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        detail = %e.detail(),
                        "transient backend error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(sql = %sql, detail = %e.detail(), "query execution failed");
                    return Err(e);
                }
            }
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.contains("mode=memory")
}

fn query_rows(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[Value],
    columns: &[ColumnSpec],
) -> ExecutionResult<Vec<Row>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut decoded = Row::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let value = decode(row.get_ref(i)?, column)?;
            decoded.push(column.label.clone(), value);
        }
        out.push(decoded);
    }
    Ok(out)
}

fn decode(raw: ValueRef<'_>, column: &ColumnSpec) -> ExecutionResult<Value> {
    let decode_error = |detail: String| ExecutionError::Decode {
        column: column.label.clone(),
        detail,
    };

    Ok(match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(x) => Value::Real(x),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))?;
            if column.date {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map(Value::Date)
                    .map_err(|e| decode_error(format!("{}: {:?}", e, text)))?
            } else {
                Value::Text(text.to_string())
            }
        }
        ValueRef::Blob(_) => return Err(decode_error("unexpected blob".into())),
    })
}
