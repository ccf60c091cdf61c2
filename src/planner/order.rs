//! Field list and sort-spec parsing.
//!
//! Sort entries look like `clicks`, `-clicks`, `clicks-`, `+clicks`,
//! `clicks desc`, `clicksasc`. Any `-` or `desc` anywhere makes the entry
//! descending; all markers are stripped to recover the field name.

use crate::sql::SortDir;

/// Markers removed from a sort entry, in this order.
const DIRECTION_MARKERS: [&str; 4] = ["+", "asc", "-", "desc"];

/// A parsed sort entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: SortDir,
}

/// Split a comma-separated list, trimming each entry and dropping empty ones.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse one sort entry. `None` when nothing but markers remain.
pub fn parse_order_entry(entry: &str) -> Option<OrderTerm> {
    let direction = if entry.contains('-') || entry.contains("desc") {
        SortDir::Desc
    } else {
        SortDir::Asc
    };

    let field: String = DIRECTION_MARKERS
        .iter()
        .fold(entry.to_string(), |acc, marker| acc.replace(marker, ""))
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if field.is_empty() {
        None
    } else {
        Some(OrderTerm { field, direction })
    }
}

/// Parse a whole sort spec into terms, in order.
pub fn parse_order_spec(spec: &str) -> Vec<OrderTerm> {
    spec.split(',').filter_map(parse_order_entry).collect()
}
