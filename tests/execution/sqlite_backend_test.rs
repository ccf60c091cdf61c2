//! End-to-end queries against an in-memory SQLite database seeded from the fixture CSV.

use std::sync::Arc;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use adlens::config::{DatabaseSettings, Settings};
use adlens::execution::{ExecutionError, Row, SqliteBackend};
use adlens::loader;
use adlens::request::QueryRequest;
use adlens::schema::StarSchema;
use adlens::value::Value;
use adlens::{Engine, ErrorKind};
use chrono::NaiveDate;
use uuid::Uuid;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/performance.csv");

async fn engine() -> Engine {
    let mut settings = Settings::default();
    settings.data.sample_csv = Some(FIXTURE.to_string());
    Engine::from_settings(&settings).await.unwrap()
}

fn text(row: &Row, label: &str) -> String {
    row.get(label)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number(row: &Row, label: &str) -> f64 {
    row.get(label).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

#[tokio::test]
async fn test_channel_country_breakdown() {
    let engine = engine().await;
    let request = QueryRequest::new("channel,country,impressions,clicks")
        .group("channel,country")
        .order("-clicks")
        .date_to(NaiveDate::from_ymd_opt(2017, 6, 1).unwrap());

    let rows = engine.run(&request).await.unwrap();
    let got: Vec<_> = rows
        .iter()
        .map(|r| {
            (
                text(r, "channel"),
                text(r, "country"),
                number(r, "impressions"),
                number(r, "clicks"),
            )
        })
        .collect();

    let want = vec![
        ("adcolony", "US", 2700.0, 240.0),
        ("chartboost", "US", 1200.0, 100.0),
        ("adcolony", "DE", 700.0, 50.0),
        ("vungle", "DE", 500.0, 40.0),
        ("chartboost", "GB", 400.0, 30.0),
        ("vungle", "US", 300.0, 25.0),
    ];
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(&want) {
        assert_eq!((g.0.as_str(), g.1.as_str(), g.2, g.3), *w);
    }
}

#[tokio::test]
async fn test_channel_cpi_sums_per_row_ratio() {
    let engine = engine().await;
    let request = QueryRequest::new("channel,cpi,spend")
        .group("channel")
        .order("-cpi");

    let rows = engine.run(&request).await.unwrap();
    let got: Vec<_> = rows
        .iter()
        .map(|r| (text(r, "channel"), number(r, "cpi"), number(r, "spend")))
        .collect();

    assert_eq!(
        got,
        vec![
            ("adcolony".to_string(), 23.0, 87.0),
            ("vungle".to_string(), 9.0, 31.0),
            ("chartboost".to_string(), 3.5, 36.0),
        ]
    );
}

#[tokio::test]
async fn test_rows_keep_select_order_and_types() {
    let engine = engine().await;
    let rows = engine
        .run(&QueryRequest::new("revenue,date,installs").order("date,revenue"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(
        rows[0].labels().collect::<Vec<_>>(),
        vec!["revenue", "date", "installs"]
    );
    assert_eq!(
        rows[0].get("date"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2017, 5, 17).unwrap()))
    );
    assert!(matches!(rows[0].get("revenue"), Some(Value::Real(_))));
    assert!(matches!(rows[0].get("installs"), Some(Value::Integer(_))));
}

#[tokio::test]
async fn test_dimension_filters() {
    let engine = engine().await;
    let rows = engine
        .run(
            &QueryRequest::new("date,clicks")
                .filter("channel", "vungle")
                .filter("operating_system", "android")
                .order("date"),
        )
        .await
        .unwrap();

    let clicks: Vec<_> = rows.iter().map(|r| number(r, "clicks")).collect();
    assert_eq!(clicks, vec![40.0, 45.0]);
}

#[tokio::test]
async fn test_unknown_field_never_executes() {
    let engine = engine().await;
    let err = engine
        .run(&QueryRequest::new("channel").group("platform"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(err.to_string().contains("platform"));
}

#[tokio::test]
async fn test_wire_params_end_to_end() {
    let engine = engine().await;
    let request = engine
        .parse_request([
            ("fields", "country,installs"),
            ("group", "country"),
            ("order", "installs desc"),
            ("date_from", "2017-06-01"),
        ])
        .unwrap();
    let rows = engine.run(&request).await.unwrap();

    let got: Vec<_> = rows
        .iter()
        .map(|r| (text(r, "country"), number(r, "installs")))
        .collect();
    assert_eq!(
        got,
        vec![("GB".to_string(), 18.0), ("US".to_string(), 8.0)]
    );
}

#[tokio::test]
async fn test_backend_errors_are_generic() {
    let backend = SqliteBackend::open(None, &DatabaseSettings::default()).unwrap();
    // No schema: the statement fails inside SQLite.
    let engine = Engine::new(StarSchema::performance(), Arc::new(backend));

    let err = engine.run(&QueryRequest::new("clicks")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.to_string(), "query execution failed");
}

async fn user_tables(backend: &SqliteBackend) -> i64 {
    backend
        .interact(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get::<_, i64>(0),
            )?)
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_separate_backends_are_isolated() {
    let settings = DatabaseSettings::default();
    let a = SqliteBackend::open(None, &settings).unwrap();
    let b = SqliteBackend::open(None, &settings).unwrap();
    assert_ne!(a.url(), b.url());

    let schema = StarSchema::performance();
    loader::bootstrap(&a, &schema, Some(FIXTURE.into())).await.unwrap();

    assert_eq!(user_tables(&a).await, 4);
    assert_eq!(user_tables(&b).await, 0);
}

#[tokio::test]
async fn test_schema_only_bootstrap_returns_empty() {
    let mut settings = Settings::default();
    settings.data.sample_csv = None;
    let (engine, report) = Engine::bootstrap(&settings).await.unwrap();

    assert_eq!(report.map(|r| r.records), Some(0));
    let rows = engine.run(&QueryRequest::new("channel,clicks")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_load_disabled_skips_schema() {
    let mut settings = Settings::default();
    settings.data.load_on_start = false;
    let (engine, report) = Engine::bootstrap(&settings).await.unwrap();

    assert!(report.is_none());
    let err = engine.run(&QueryRequest::new("clicks")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

/// A file database seeded from the fixture, with short lock waits.
async fn file_engine(max_retries: u32) -> (Engine, PathBuf) {
    let path = std::env::temp_dir().join(format!("adlens-{}.db", Uuid::new_v4().simple()));
    let mut settings = Settings::default();
    settings.database.url = Some(path.display().to_string());
    settings.database.query_timeout_ms = 2000;
    settings.database.busy_timeout_ms = 50;
    settings.database.max_retries = max_retries;
    settings.database.retry_backoff_ms = 20;
    settings.data.sample_csv = Some(FIXTURE.to_string());
    (Engine::from_settings(&settings).await.unwrap(), path)
}

#[tokio::test]
async fn test_locked_database_is_retried_until_released() {
    let (engine, path) = file_engine(8).await;
    let locker = rusqlite::Connection::open(&path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let started = Instant::now();
    let query = tokio::spawn(async move { engine.run(&QueryRequest::new("date,clicks")).await });
    tokio::time::sleep(Duration::from_millis(300)).await;
    locker.execute_batch("COMMIT").unwrap();

    let rows = query.await.unwrap().unwrap();
    assert_eq!(rows.len(), 10);
    assert!(started.elapsed() >= Duration::from_millis(300));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_locked_database_reports_busy_before_deadline() {
    let (engine, path) = file_engine(0).await;
    let locker = rusqlite::Connection::open(&path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE").unwrap();

    let started = Instant::now();
    let err = engine.run(&QueryRequest::new("clicks")).await.unwrap_err();
    // Busy surfaces well inside the 2 s query deadline instead of timing out.
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(err.kind(), ErrorKind::Execution);

    locker.execute_batch("COMMIT").unwrap();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_timeout_is_not_retried() {
    let err = ExecutionError::Timeout {
        after: Duration::from_millis(50),
    };
    assert!(!err.is_transient());
    assert_eq!(err.to_string(), "query execution timed out");
}
