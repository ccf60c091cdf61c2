//! Result-level properties that hold for any request over the fixture data.

use adlens::config::Settings;
use adlens::execution::Row;
use adlens::request::QueryRequest;
use adlens::value::Value;
use adlens::Engine;
use chrono::NaiveDate;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/performance.csv");
const FIXTURE_ROWS: usize = 10;
const TOTAL_CLICKS: f64 = 620.0;

async fn engine() -> Engine {
    let mut settings = Settings::default();
    settings.data.sample_csv = Some(FIXTURE.to_string());
    Engine::from_settings(&settings).await.unwrap()
}

fn column(rows: &[Row], label: &str) -> Vec<f64> {
    rows.iter()
        .map(|r| r.get(label).and_then(Value::as_f64).unwrap_or(f64::NAN))
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_ungrouped_returns_one_row_per_fact() {
    let engine = engine().await;
    for fields in ["clicks", "channel,country", "date,operating_system,cpi"] {
        let rows = engine.run(&QueryRequest::new(fields)).await.unwrap();
        assert_eq!(rows.len(), FIXTURE_ROWS, "fields: {}", fields);
    }
}

#[tokio::test]
async fn test_grouping_conserves_totals() {
    let engine = engine().await;
    for group in ["channel", "country", "operating_system", "date", "channel,country"] {
        let fields = format!("{},clicks", group);
        let rows = engine
            .run(&QueryRequest::new(fields).group(group))
            .await
            .unwrap();
        let total: f64 = column(&rows, "clicks").iter().sum();
        assert!(approx(total, TOTAL_CLICKS), "group {}: {}", group, total);
    }
}

#[tokio::test]
async fn test_date_bounds_are_inclusive() {
    let engine = engine().await;
    let day = |d| NaiveDate::from_ymd_opt(2017, 6, d).unwrap();

    let rows = engine
        .run(&QueryRequest::new("clicks").date_to(day(1)))
        .await
        .unwrap();
    let total: f64 = column(&rows, "clicks").iter().sum();
    assert!(approx(total, 485.0), "{}", total);

    let rows = engine
        .run(&QueryRequest::new("date").date_from(day(1)).date_to(day(1)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.get("date") == Some(&Value::Date(day(1)))));
}

#[tokio::test]
async fn test_order_is_monotonic() {
    let engine = engine().await;
    for (order, descending) in [("spend", false), ("-spend", true), ("spend desc", true)] {
        let rows = engine
            .run(&QueryRequest::new("channel,spend").order(order))
            .await
            .unwrap();
        let spend = column(&rows, "spend");
        let sorted = spend.windows(2).all(|w| {
            if descending {
                w[0] >= w[1]
            } else {
                w[0] <= w[1]
            }
        });
        assert!(sorted, "order {}: {:?}", order, spend);
    }
}

#[tokio::test]
async fn test_cpi_per_row() {
    let engine = engine().await;
    let rows = engine
        .run(&QueryRequest::new("spend,installs,cpi"))
        .await
        .unwrap();

    for row in &rows {
        let spend = row.get("spend").and_then(Value::as_f64).unwrap();
        let installs = row.get("installs").and_then(Value::as_f64).unwrap();
        let cpi = row.get("cpi").and_then(Value::as_f64).unwrap();
        let expected = if installs == 0.0 { spend } else { spend / installs };
        assert!(approx(cpi, expected), "{:?}", row);
    }

    let mut cpi = column(&rows, "cpi");
    cpi.sort_by(f64::total_cmp);
    assert_eq!(cpi, vec![1.5, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0, 4.0, 5.0, 12.0]);
}

#[tokio::test]
async fn test_filter_on_summed_value_applies_after_grouping() {
    let engine = engine().await;
    let grouped = |clicks: i64| {
        QueryRequest::new("channel,clicks")
            .group("channel")
            .filter("clicks", clicks)
    };

    // No channel totals 100 clicks, although two individual rows do.
    assert!(engine.run(&grouped(100)).await.unwrap().is_empty());

    let rows = engine.run(&grouped(110)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("channel"), Some(&Value::Text("vungle".into())));

    let rows = engine
        .run(&QueryRequest::new("channel,clicks").filter("clicks", 100i64))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_unmatched_filter_is_empty_not_error() {
    let engine = engine().await;
    let rows = engine
        .run(&QueryRequest::new("channel,clicks").filter("country", "FR"))
        .await
        .unwrap();
    assert!(rows.is_empty());
}
