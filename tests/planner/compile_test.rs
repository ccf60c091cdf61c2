//! Compiler behaviour through the public API: select/group/order/filter placement.

use adlens::catalog::FieldCatalog;
use adlens::execution::render_sql;
use adlens::planner::{Clause, Comparison, PlanError, QueryCompiler, QueryPlan};
use adlens::request::QueryRequest;
use adlens::schema::StarSchema;
use adlens::sql::{Dialect, SortDir};
use adlens::value::Value;
use chrono::NaiveDate;
use insta::assert_snapshot;

fn compile(request: &QueryRequest) -> Result<QueryPlan, PlanError> {
    let schema = StarSchema::performance();
    let catalog = FieldCatalog::from_schema(&schema);
    QueryCompiler::new(&schema, &catalog).compile(request)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_channel_country_breakdown_sql() {
    let request = QueryRequest::new("channel,country,impressions,clicks")
        .group("channel,country")
        .order("-clicks")
        .date_to(date(2017, 6, 1));
    let plan = compile(&request).unwrap();

    assert_snapshot!(render_sql(&plan, Dialect::Sqlite), @r#"
    SELECT
      "channels"."channel" AS "channel",
      "countries"."country" AS "country",
      SUM("performance_metrics"."impressions") AS "impressions",
      SUM("performance_metrics"."clicks") AS "clicks"
    FROM "performance_metrics"
    INNER JOIN "channels" ON "channels"."id" = "performance_metrics"."channel_id"
    INNER JOIN "countries" ON "countries"."id" = "performance_metrics"."country_id"
    INNER JOIN "operating_systems" ON "operating_systems"."id" = "performance_metrics"."operating_system_id"
    WHERE "performance_metrics"."date" <= '2017-06-01'
    GROUP BY "channels"."channel", "countries"."country"
    ORDER BY 4 DESC
    "#);
}

#[test]
fn test_channel_cpi_sql() {
    let request = QueryRequest::new("channel,cpi,spend")
        .group("channel")
        .order("cpi desc");
    let plan = compile(&request).unwrap();

    assert_snapshot!(render_sql(&plan, Dialect::Postgres), @r#"
    SELECT
      "channels"."channel" AS "channel",
      SUM(CASE WHEN "performance_metrics"."installs" = 0 THEN "performance_metrics"."spend" ELSE "performance_metrics"."spend" / "performance_metrics"."installs" END) AS "cpi",
      SUM("performance_metrics"."spend") AS "spend"
    FROM "performance_metrics"
    INNER JOIN "channels" ON "channels"."id" = "performance_metrics"."channel_id"
    INNER JOIN "countries" ON "countries"."id" = "performance_metrics"."country_id"
    INNER JOIN "operating_systems" ON "operating_systems"."id" = "performance_metrics"."operating_system_id"
    GROUP BY "channels"."channel"
    ORDER BY 2 DESC
    "#);
}

#[test]
fn test_no_group_means_no_aggregation() {
    let plan = compile(&QueryRequest::new("date,channel,cpi")).unwrap();
    assert!(!plan.is_grouped());
    assert!(plan.group_by.is_empty());
    assert!(plan.select.iter().all(|p| !p.operand.is_aggregate()));
}

#[test]
fn test_every_plan_joins_all_dimensions() {
    for fields in ["clicks", "channel", "date,operating_system"] {
        let plan = compile(&QueryRequest::new(fields)).unwrap();
        let joined: Vec<_> = plan.joins.iter().map(|j| j.right.as_str()).collect();
        assert_eq!(joined, vec!["channels", "countries", "operating_systems"]);
    }
}

#[test]
fn test_group_order_follows_select_list() {
    let plan = compile(&QueryRequest::new("country,channel,clicks").group("channel,country")).unwrap();
    let grouped: Vec<_> = plan.group_by.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(grouped, vec!["country", "channel"]);
}

#[test]
fn test_multi_key_order() {
    let plan = compile(
        &QueryRequest::new("date,channel,installs")
            .group("date,channel")
            .order("date,-installs"),
    )
    .unwrap();

    let keys: Vec<_> = plan
        .order_by
        .iter()
        .map(|k| (k.position, k.direction))
        .collect();
    assert_eq!(keys, vec![(1, SortDir::Asc), (3, SortDir::Desc)]);
}

#[test]
fn test_filter_on_unselected_field_is_where() {
    let plan = compile(
        &QueryRequest::new("channel,clicks")
            .group("channel")
            .filter("installs", 0i64),
    )
    .unwrap();

    assert!(plan.post_filters.is_empty());
    assert_eq!(plan.pre_filters.len(), 1);
    assert_eq!(plan.pre_filters[0].operand.entry().name, "installs");
    assert!(!plan.pre_filters[0].operand.is_aggregate());
}

#[test]
fn test_filter_on_grouped_field_is_where() {
    let plan = compile(
        &QueryRequest::new("channel,clicks")
            .group("channel")
            .filter("channel", "adcolony"),
    )
    .unwrap();
    assert!(plan.post_filters.is_empty());
    assert_eq!(plan.pre_filters[0].value, Value::Text("adcolony".into()));
}

#[test]
fn test_filter_on_summed_field_is_having() {
    let plan = compile(
        &QueryRequest::new("channel,clicks")
            .group("channel")
            .filter("clicks", 100i64),
    )
    .unwrap();

    assert!(plan.pre_filters.is_empty());
    assert_eq!(plan.post_filters.len(), 1);
    assert_eq!(plan.post_filters[0].op, Comparison::Eq);
    assert!(plan.post_filters[0].operand.is_aggregate());
}

#[test]
fn test_date_range_is_inclusive() {
    let plan = compile(
        &QueryRequest::new("clicks")
            .date_from(date(2017, 5, 17))
            .date_to(date(2017, 5, 17)),
    )
    .unwrap();
    let ops: Vec<_> = plan.pre_filters.iter().map(|p| p.op).collect();
    assert_eq!(ops, vec![Comparison::Gte, Comparison::Lte]);
}

#[test]
fn test_unknown_field_names_the_field() {
    let err = compile(&QueryRequest::new("channel").filter("platform", "ios")).unwrap_err();
    assert_eq!(
        err,
        PlanError::UnknownField {
            field: "platform".into(),
            clause: Clause::Filter,
        }
    );
    assert_eq!(err.to_string(), "no such field: platform (in filter)");
}

#[test]
fn test_unorderable_field() {
    let err = compile(&QueryRequest::new("channel,clicks").order("installs")).unwrap_err();
    assert_eq!(err.field(), Some("installs"));
    assert!(!err.is_resolution());
}

#[test]
fn test_empty_select() {
    assert_eq!(compile(&QueryRequest::new("")).unwrap_err(), PlanError::EmptySelect);
}
