//! Sort-spec syntax: direction markers, stripping and positional binding.

use adlens::catalog::FieldCatalog;
use adlens::planner::{parse_order_entry, parse_order_spec, PlanError, QueryCompiler};
use adlens::request::QueryRequest;
use adlens::schema::StarSchema;
use adlens::sql::SortDir;

fn direction(entry: &str) -> Option<(String, SortDir)> {
    parse_order_entry(entry).map(|t| (t.field, t.direction))
}

#[test]
fn test_marker_combinations() {
    let cases = [
        ("clicks", SortDir::Asc),
        ("+clicks", SortDir::Asc),
        ("clicks asc", SortDir::Asc),
        ("clicksasc", SortDir::Asc),
        ("-clicks", SortDir::Desc),
        ("clicks-", SortDir::Desc),
        ("clicks desc", SortDir::Desc),
        ("clicksdesc", SortDir::Desc),
        ("+clicks desc", SortDir::Desc),
        ("-clicks asc", SortDir::Desc),
    ];

    for (entry, expected) in cases {
        assert_eq!(
            direction(entry),
            Some(("clicks".to_string(), expected)),
            "entry: {:?}",
            entry
        );
    }
}

#[test]
fn test_blank_entries_skipped() {
    let terms = parse_order_spec(" ,-, +installs ,");
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].field, "installs");
}

#[test]
fn test_field_names_containing_markers() {
    // "operating_system" survives: no marker substring appears in it.
    assert_eq!(
        direction("-operating_system"),
        Some(("operating_system".to_string(), SortDir::Desc))
    );
}

#[test]
fn test_binds_to_first_selected_position() {
    let schema = StarSchema::performance();
    let catalog = FieldCatalog::from_schema(&schema);
    let compiler = QueryCompiler::new(&schema, &catalog);

    let plan = compiler
        .compile(&QueryRequest::new("spend, revenue ,spend").order("revenue-, spend"))
        .unwrap();
    let keys: Vec<_> = plan
        .order_by
        .iter()
        .map(|k| (k.label.as_str(), k.position, k.direction))
        .collect();
    assert_eq!(
        keys,
        vec![("revenue", 2, SortDir::Desc), ("spend", 1, SortDir::Asc)]
    );

    let err = compiler
        .compile(&QueryRequest::new("spend").order("-revenue"))
        .unwrap_err();
    assert_eq!(
        err,
        PlanError::Unorderable {
            field: "revenue".into()
        }
    );
}
