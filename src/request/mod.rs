//! Request model: wire-level query parameters -> validated [`QueryRequest`].
//!
//! Validation happens here, before the compiler runs: numeric filters must
//! be non-negative numbers and dates must be calendar dates. The compiler
//! only ever sees typed values.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::FieldCatalog;
use crate::sql::types::DataType;
use crate::value::{Value, DATE_FORMAT};

pub const FIELDS_PARAM: &str = "fields";
pub const GROUP_PARAM: &str = "group";
pub const ORDER_PARAM: &str = "order";
pub const DATE_FROM_PARAM: &str = "date_from";
pub const DATE_TO_PARAM: &str = "date_to";

/// Parameter names with dedicated meaning; never equality filters.
pub const RESERVED_PARAMS: [&str; 5] = [
    FIELDS_PARAM,
    GROUP_PARAM,
    ORDER_PARAM,
    DATE_FROM_PARAM,
    DATE_TO_PARAM,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid date for {param}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { param: String, value: String },

    #[error("invalid number for {param}: {value:?}")]
    InvalidNumber { param: String, value: String },

    #[error("{param} must not be negative, got {value}")]
    NegativeValue { param: String, value: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A validated aggregation request.
///
/// List-valued parameters keep their comma-separated wire form; splitting
/// them is the compiler's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    /// Output fields, comma-separated, in output order.
    pub fields: String,
    /// Grouping fields, comma-separated.
    pub group: Option<String>,
    /// Sort spec, comma-separated, each entry optionally `+`/`-`/`asc`/`desc` marked.
    pub order: Option<String>,
    /// Inclusive lower date bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<NaiveDate>,
    /// Equality filters by field name.
    pub filters: BTreeMap<String, Value>,
}

impl QueryRequest {
    pub fn new(fields: impl Into<String>) -> Self {
        Self {
            fields: fields.into(),
            group: None,
            order: None,
            date_from: None,
            date_to: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// Add an equality filter. Reserved names are ignored.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if !is_reserved(&field) {
            self.filters.insert(field, value.into());
        }
        self
    }

    /// Parse and validate wire parameters.
    ///
    /// Filter values are typed by the catalog entry of the same name. A key
    /// the catalog does not know is kept as text so the compiler reports it
    /// as an unknown field. Blank `group`/`order` values mean "not given";
    /// on repeated keys the last value wins.
    pub fn from_params<I, K, V>(params: I, catalog: &FieldCatalog) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = None;
        let mut request = QueryRequest::new(String::new());

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                FIELDS_PARAM => fields = Some(value.to_string()),
                GROUP_PARAM => request.group = non_blank(value),
                ORDER_PARAM => request.order = non_blank(value),
                DATE_FROM_PARAM => request.date_from = Some(parse_date(key, value)?),
                DATE_TO_PARAM => request.date_to = Some(parse_date(key, value)?),
                _ => {
                    let typed = match catalog.get(key) {
                        Some(entry) => parse_typed(key, value, entry.data_type)?,
                        None => Value::Text(value.to_string()),
                    };
                    request.filters.insert(key.to_string(), typed);
                }
            }
        }

        request.fields = fields.ok_or(ValidationError::MissingParameter(FIELDS_PARAM))?;
        Ok(request)
    }
}

/// Whether `name` is one of the dedicated parameters.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(param: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            param: param.to_string(),
            value: value.to_string(),
        }
    })
}

fn parse_typed(param: &str, value: &str, data_type: DataType) -> ValidationResult<Value> {
    let invalid = || ValidationError::InvalidNumber {
        param: param.to_string(),
        value: value.to_string(),
    };
    let negative = || ValidationError::NegativeValue {
        param: param.to_string(),
        value: value.to_string(),
    };

    match data_type {
        DataType::Integer => {
            let n: i64 = value.trim().parse().map_err(|_| invalid())?;
            if n < 0 {
                return Err(negative());
            }
            Ok(Value::Integer(n))
        }
        DataType::Real => {
            let x: f64 = value.trim().parse().map_err(|_| invalid())?;
            if !x.is_finite() {
                return Err(invalid());
            }
            if x < 0.0 {
                return Err(negative());
            }
            Ok(Value::Real(x))
        }
        DataType::Text => Ok(Value::Text(value.to_string())),
        DataType::Date => parse_date(param, value).map(Value::Date),
    }
}
