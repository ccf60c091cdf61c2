//! Wire parameters -> QueryRequest validation.

use adlens::catalog::FieldCatalog;
use adlens::request::{is_reserved, QueryRequest, ValidationError, RESERVED_PARAMS};
use adlens::schema::StarSchema;
use adlens::value::Value;
use chrono::NaiveDate;

fn parse(params: &[(&str, &str)]) -> Result<QueryRequest, ValidationError> {
    let catalog = FieldCatalog::from_schema(&StarSchema::performance());
    QueryRequest::from_params(params.iter().copied(), &catalog)
}

#[test]
fn test_full_request() {
    let req = parse(&[
        ("fields", "channel,country,impressions,clicks"),
        ("group", "channel,country"),
        ("order", "-clicks"),
        ("date_from", "2017-05-17"),
        ("date_to", "2017-06-01"),
        ("os", "ios"),
    ])
    .unwrap();

    assert_eq!(req.fields, "channel,country,impressions,clicks");
    assert_eq!(req.group.as_deref(), Some("channel,country"));
    assert_eq!(req.order.as_deref(), Some("-clicks"));
    assert_eq!(req.date_from, NaiveDate::from_ymd_opt(2017, 5, 17));
    assert_eq!(req.date_to, NaiveDate::from_ymd_opt(2017, 6, 1));
    assert_eq!(req.filters.len(), 1);
    assert_eq!(req.filters["os"], Value::Text("ios".into()));
}

#[test]
fn test_reserved_names_never_filters() {
    for name in RESERVED_PARAMS {
        assert!(is_reserved(name));
    }
    assert!(!is_reserved("channel"));

    let req = parse(&[("fields", "clicks"), ("order", "clicks")]).unwrap();
    assert!(req.filters.is_empty());
}

#[test]
fn test_last_value_wins() {
    let req = parse(&[("fields", "clicks"), ("fields", "installs"), ("spend", "1"), ("spend", "2.5")])
        .unwrap();
    assert_eq!(req.fields, "installs");
    assert_eq!(req.filters["spend"], Value::Real(2.5));
}

#[test]
fn test_integer_field_rejects_fraction() {
    let err = parse(&[("fields", "clicks"), ("clicks", "1.5")]).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidNumber { .. }));
}

#[test]
fn test_negative_real_rejected() {
    let err = parse(&[("fields", "spend"), ("revenue", "-0.01")]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::NegativeValue {
            param: "revenue".into(),
            value: "-0.01".into(),
        }
    );
}

#[test]
fn test_date_filter_is_typed() {
    let req = parse(&[("fields", "clicks"), ("date", "2017-05-17")]).unwrap();
    assert_eq!(
        req.filters["date"],
        Value::Date(NaiveDate::from_ymd_opt(2017, 5, 17).unwrap())
    );

    let err = parse(&[("fields", "clicks"), ("date", "yesterday")]).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidDate { .. }));
}

#[test]
fn test_missing_fields_message() {
    let err = parse(&[]).unwrap_err();
    assert_eq!(err.to_string(), "missing required parameter: fields");
}
