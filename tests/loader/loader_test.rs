//! CSV ingestion into the star schema.

use std::path::Path;

use adlens::loader::{create_schema, load_csv, load_csv_file, LoadError};
use adlens::schema::StarSchema;
use rusqlite::Connection;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn setup() -> (Connection, StarSchema) {
    let conn = Connection::open_in_memory().unwrap();
    let schema = StarSchema::performance();
    create_schema(&conn, &schema).unwrap();
    (conn, schema)
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn test_fixture_load_report() {
    let (mut conn, schema) = setup();
    let report =
        load_csv_file(&mut conn, &schema, &fixture("tests/fixtures/performance.csv")).unwrap();

    assert_eq!(report.records, 10);
    assert_eq!(report.inserted("performance_metrics"), 10);
    assert_eq!(report.inserted("channels"), 3);
    assert_eq!(report.inserted("countries"), 3);
    assert_eq!(report.inserted("operating_systems"), 2);

    assert_eq!(count(&conn, "performance_metrics"), 10);
    assert_eq!(count(&conn, "channels"), 3);
}

#[test]
fn test_facts_reference_their_dimensions() {
    let (mut conn, schema) = setup();
    load_csv_file(&mut conn, &schema, &fixture("tests/fixtures/performance.csv")).unwrap();

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM performance_metrics m \
             LEFT JOIN channels c ON c.id = m.channel_id \
             LEFT JOIN countries k ON k.id = m.country_id \
             LEFT JOIN operating_systems o ON o.id = m.operating_system_id \
             WHERE c.id IS NULL OR k.id IS NULL OR o.id IS NULL",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);

    let adcolony_clicks: i64 = conn
        .query_row(
            "SELECT SUM(m.clicks) FROM performance_metrics m \
             JOIN channels c ON c.id = m.channel_id WHERE c.channel = 'adcolony'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(adcolony_clicks, 380);
}

#[test]
fn test_bundled_sample_data_loads() {
    let (mut conn, schema) = setup();
    let report = load_csv_file(&mut conn, &schema, &fixture("data/sample_data.csv")).unwrap();

    assert!(report.records > 0);
    assert_eq!(report.inserted("performance_metrics"), report.records);
    assert_eq!(count(&conn, "performance_metrics") as usize, report.records);
}

#[test]
fn test_whitespace_is_trimmed() {
    let (mut conn, schema) = setup();
    let csv = "date, channel ,country,os,impressions,clicks,installs,spend,revenue\n\
               2017-05-17, adcolony ,US , ios,10,1,1,2.0,1.0\n\
               2017-05-18,adcolony,US,ios,10,1,1,2.0,1.0\n";
    let report = load_csv(&mut conn, &schema, csv.as_bytes()).unwrap();

    assert_eq!(report.records, 2);
    assert_eq!(report.inserted("channels"), 1);
    assert_eq!(report.inserted("countries"), 1);
}

#[test]
fn test_missing_column_is_rejected() {
    let (mut conn, schema) = setup();
    let csv = "date,channel,country,os,impressions,clicks,installs,spend\n\
               2017-05-17,adcolony,US,ios,10,1,1,2.0\n";
    let err = load_csv(&mut conn, &schema, csv.as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::Csv { line: 2, .. }), "{:?}", err);
    assert_eq!(count(&conn, "channels"), 0);
}

#[test]
fn test_missing_file_names_path() {
    let (mut conn, schema) = setup();
    let err = load_csv_file(&mut conn, &schema, &fixture("tests/fixtures/absent.csv"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"));
}
